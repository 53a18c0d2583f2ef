pub mod canvas;
pub mod colormap;
pub mod encode;
pub mod font;
pub mod interactive;
pub mod plotly;
pub mod static_map;

pub use colormap::{Colormap, Rgb};
pub use interactive::{InteractiveMap, MapOptions};
pub use plotly::{PlotlyFigure, PlotlyMapOptions};
pub use static_map::{
    create_comparison_map, plot_choropleth, plot_points, plot_polygons, ChoroplethOptions, Figure, PlotOptions,
};
