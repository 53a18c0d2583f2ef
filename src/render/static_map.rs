//! Static PNG maps: polygon and point plots, choropleths and side by side
//! comparisons.

use std::path::{Path, PathBuf};

use geo::{Coord, Geometry, LineString, Polygon, Rect};
use image::RgbaImage;
use rusttype::Scale;
use tracing::info;

use crate::error::{Error, Result};
use crate::feature::{PropertyValue, SpatialTable};
use crate::render::canvas::{Canvas, PixelRect, Viewport};
use crate::render::colormap::{Colormap, Rgb};
use crate::render::encode::{encode_png, DPI};
use crate::render::font::Typeface;

pub const DEFAULT_TITLE: &str = "USDA Forest Service Data";
pub const CHOROPLETH_TITLE: &str = "Choropleth Map";

/// Fill used when no column drives the colour.
const SINGLE_FILL: Rgb = Rgb::new(0x1f, 0x77, 0xb4);
const DATA_MARGIN: f64 = 0.05;
const LEGEND_GRAY: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);

const TITLE_POINTS: f64 = 16.0;
const PANEL_TITLE_POINTS: f64 = 14.0;
const LABEL_POINTS: f64 = 12.0;
const TICK_POINTS: f64 = 10.0;

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::BufReader;

    use image::Rgba;

    use crate::error::Error;
    use crate::feature::{Feature, SpatialTable};
    use crate::render::colormap::{Colormap, Rgb};
    use crate::render::static_map::{
        create_comparison_map, format_tick, nice_ticks, plot_choropleth, plot_points, plot_polygons,
        style_features, ChoroplethOptions, Legend, PlotOptions,
    };
    use crate::test::{campgrounds, harvest_units, square, with_input_and_output_paths};

    fn small() -> PlotOptions {
        PlotOptions { figsize: (4.0, 3.0), ..PlotOptions::default() }
    }

    fn bluish(pixel: &Rgba<u8>) -> bool {
        pixel[2] as i32 > pixel[0] as i32 + 50
    }

    #[test]
    fn polygons_render_at_300_dpi() {
        let figure = plot_polygons(&harvest_units(), &small()).unwrap();

        assert_eq!((1200, 900), (figure.width(), figure.height()));
        assert_eq!("USDA Forest Service Data", figure.title());
        assert!(figure.image().pixels().any(bluish));
    }

    #[test]
    fn saves_when_an_output_path_is_given() {
        with_input_and_output_paths(|_, output_path| {
            let path = output_path.join("maps").join("units.png");
            let options = PlotOptions { output_path: Some(path.clone()), title: "Units".into(), ..small() };

            plot_polygons(&harvest_units(), &options).unwrap();

            let decoder = png::Decoder::new(BufReader::new(File::open(&path).unwrap()));
            let reader = decoder.read_info().unwrap();
            assert_eq!((1200, 900), (reader.info().width, reader.info().height));
            assert!(reader.info().uncompressed_latin1_text.iter().any(|t| t.text == "Units"));
        })
        .unwrap();
    }

    #[test]
    fn points_render_with_a_numeric_column() {
        let options = PlotOptions { column: Some("sites".into()), colormap: Colormap::Plasma, alpha: 1.0, ..small() };
        let figure = plot_points(&campgrounds(), &options).unwrap();

        assert_eq!((1200, 900), (figure.width(), figure.height()));
        let (low, high) = (Colormap::Plasma.evaluate(0.0), Colormap::Plasma.evaluate(1.0));
        assert!(figure.image().pixels().any(|p| *p == Rgba([low.r, low.g, low.b, 255])));
        assert!(figure.image().pixels().any(|p| *p == Rgba([high.r, high.g, high.b, 255])));
    }

    #[test]
    fn missing_columns_are_reported() {
        let options = PlotOptions { column: Some("owner".into()), ..small() };
        assert!(matches!(plot_polygons(&harvest_units(), &options), Err(Error::ColumnNotFound(c)) if c == "owner"));

        let choropleth = ChoroplethOptions { figsize: (4.0, 3.0), ..ChoroplethOptions::default() };
        assert!(matches!(
            plot_choropleth(&harvest_units(), "owner", &choropleth),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn choropleth_needs_numbers() {
        let options = ChoroplethOptions { figsize: (4.0, 3.0), ..ChoroplethOptions::default() };

        assert!(matches!(plot_choropleth(&harvest_units(), "kind", &options), Err(Error::Unsupported(_))));

        let figure = plot_choropleth(&harvest_units(), "acres", &options).unwrap();
        assert_eq!("Choropleth Map", figure.title());
        let top = Colormap::YlOrRd.evaluate(1.0);
        assert!(figure.image().pixels().any(|p| *p == Rgba([top.r, top.g, top.b, 255])));
    }

    #[test]
    fn comparison_puts_panels_side_by_side() {
        let units = harvest_units();
        let figure = create_comparison_map(&[units.clone(), units], &["Before", "After"], (4.0, 2.0), None).unwrap();

        assert_eq!((1200, 600), (figure.width(), figure.height()));
        let (left, right) = figure.image().pixels().enumerate().fold((0, 0), |(l, r), (i, p)| {
            match (bluish(p), (i as u32 % 1200) < 600) {
                (true, true) => (l + 1, r),
                (true, false) => (l, r + 1),
                _ => (l, r),
            }
        });
        assert!(left > 0 && right > 0);
    }

    #[test]
    fn comparison_of_nothing_fails() {
        assert!(matches!(create_comparison_map(&[], &[], (4.0, 2.0), None), Err(Error::EmptyInput(_))));
    }

    #[test]
    fn empty_tables_still_render() {
        let empty = SpatialTable::new(harvest_units().crs(), vec![]);
        let figure = plot_polygons(&empty, &small()).unwrap();
        assert!(!figure.image().pixels().any(bluish));
    }

    #[test]
    fn categories_spread_over_the_ramp() {
        let styled = style_features(&harvest_units(), Some("kind"), Colormap::Viridis).unwrap();

        let clearcut = Colormap::Viridis.evaluate(0.0);
        let thinning = Colormap::Viridis.evaluate(1.0);
        assert_eq!(vec![Some(clearcut), Some(thinning), Some(clearcut)], styled.colors);
        assert!(matches!(styled.legend, Legend::Categories(ref entries) if entries.len() == 2));
    }

    #[test]
    fn numbers_are_normalised_and_nulls_skipped() {
        let mut units = harvest_units();
        units.push(Feature::new(square(900.0, 900.0, 10.0)));

        let styled = style_features(&units, Some("acres"), Colormap::Greens).unwrap();

        assert_eq!(Some(Colormap::Greens.evaluate(1.0)), styled.colors[2]);
        assert_eq!(Some(Colormap::Greens.evaluate(0.0)), styled.colors[1]);
        assert_eq!(None, styled.colors[3]);
        assert!(matches!(styled.legend, Legend::ColorBar { min, max, .. } if min == 2.4 && max == 2.6));
    }

    #[test]
    fn without_a_column_everything_shares_one_colour() {
        let styled = style_features(&harvest_units(), None, Colormap::Viridis).unwrap();
        assert!(styled.colors.iter().all(|c| *c == Some(Rgb::new(0x1f, 0x77, 0xb4))));
        assert!(matches!(styled.legend, Legend::None));
    }

    #[test]
    fn ticks_land_on_round_numbers() {
        assert_eq!(vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0], nice_ticks(0.0, 10.0, 5));
        assert_eq!(vec![5.0], nice_ticks(5.0, 5.0, 5));

        let fine = nice_ticks(-105.62, -105.18, 5);
        assert_eq!(5, fine.len());
        assert_eq!("-105.6", format_tick(fine[0], 0.1));
        assert_eq!("600", format_tick(600.0, 100.0));
        assert_eq!("2.45", format_tick(2.45, 0.05));
    }
}

/// Options shared by the polygon and point plots.
#[derive(Clone, Debug)]
pub struct PlotOptions {
    pub column: Option<String>,
    pub title: String,
    pub colormap: Colormap,
    /// Width and height in inches.
    pub figsize: (f64, f64),
    pub legend: bool,
    pub alpha: f64,
    pub edgecolor: Rgb,
    /// Edge width in points.
    pub linewidth: f64,
    /// Marker area in square points.
    pub markersize: f64,
    pub output_path: Option<PathBuf>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            column: None,
            title: DEFAULT_TITLE.to_string(),
            colormap: Colormap::Viridis,
            figsize: (15.0, 10.0),
            legend: true,
            alpha: 0.7,
            edgecolor: Rgb::BLACK,
            linewidth: 0.5,
            markersize: 20.0,
            output_path: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChoroplethOptions {
    pub title: String,
    pub colormap: Colormap,
    pub figsize: (f64, f64),
    pub output_path: Option<PathBuf>,
}

impl Default for ChoroplethOptions {
    fn default() -> Self {
        ChoroplethOptions {
            title: CHOROPLETH_TITLE.to_string(),
            colormap: Colormap::YlOrRd,
            figsize: (15.0, 10.0),
            output_path: None,
        }
    }
}

/// A rendered map, kept in memory until saved.
pub struct Figure {
    canvas: Canvas,
    title: String,
}

impl Figure {
    fn new(figsize: (f64, f64), title: &str) -> Result<Self> {
        if !(figsize.0 > 0.0 && figsize.1 > 0.0) {
            return Err(Error::Unsupported(format!("Figure size must be positive, got {:?}", figsize)));
        }
        let width = (figsize.0 * DPI as f64).round().max(1.0) as u32;
        let height = (figsize.1 * DPI as f64).round().max(1.0) as u32;

        Ok(Figure { canvas: Canvas::new(width, height, Rgb::WHITE)?, title: title.to_string() })
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn image(&self) -> &RgbaImage {
        self.canvas.image()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        encode_png(path, self.canvas.image(), &self.title)?;
        info!("Map saved to {}", path.display());
        Ok(())
    }

    fn finish(self, output_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = output_path {
            self.save(path)?;
        }
        Ok(self)
    }
}

fn pt(points: f64) -> f64 {
    points * DPI as f64 / 72.0
}

#[derive(Debug)]
pub(crate) enum Legend {
    None,
    ColorBar { min: f64, max: f64, colormap: Colormap },
    Categories(Vec<(String, Rgb)>),
}

/// Per feature fill, `None` for features whose value is null.
pub(crate) struct Styled {
    pub colors: Vec<Option<Rgb>>,
    pub legend: Legend,
}

pub(crate) fn style_features(table: &SpatialTable, column: Option<&str>, colormap: Colormap) -> Result<Styled> {
    let column = match column {
        Some(column) => column,
        None => {
            return Ok(Styled { colors: vec![Some(SINGLE_FILL); table.len()], legend: Legend::None });
        }
    };

    let values = table.column_values(column)?;
    let present: Vec<&PropertyValue> = values.iter().copied().filter(|v| !v.is_null()).collect();

    if !present.is_empty() && present.iter().all(|v| v.as_f64().is_some()) {
        let numbers = present.iter().filter_map(|v| v.as_f64());
        let (min, max) = numbers.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let normalise = |v: f64| if max > min { (v - min) / (max - min) } else { 0.0 };

        let colors = values.iter().map(|v| v.as_f64().map(|n| colormap.evaluate(normalise(n)))).collect();
        return Ok(Styled { colors, legend: Legend::ColorBar { min, max, colormap } });
    }

    let mut categories: Vec<String> = present.iter().map(|v| v.to_string()).collect();
    categories.sort();
    categories.dedup();

    let last = categories.len().saturating_sub(1).max(1) as f64;
    let entries: Vec<(String, Rgb)> = categories
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let color = colormap.evaluate(i as f64 / last);
            (name, color)
        })
        .collect();

    let colors = values
        .iter()
        .map(|v| match v {
            PropertyValue::Null => None,
            v => {
                let name = v.to_string();
                entries.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
            }
        })
        .collect();

    Ok(Styled { colors, legend: Legend::Categories(entries) })
}

/// Round tick positions covering `[min, max]`, about `target` of them.
pub(crate) fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !(max > min) {
        return if min.is_finite() { vec![min] } else { vec![] };
    }

    let step = tick_step(min, max, target);
    let first = (min / step).ceil();
    let last = (max / step).floor();
    (first as i64..=last as i64)
        .map(|i| {
            let v = i as f64 * step;
            if v.abs() < step * 1e-9 {
                0.0
            } else {
                v
            }
        })
        .collect()
}

fn tick_step(min: f64, max: f64, target: usize) -> f64 {
    let raw = (max - min) / target.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude)
}

pub(crate) fn format_tick(value: f64, step: f64) -> String {
    let decimals = (0..=6)
        .find(|d| {
            let scaled = step * 10f64.powi(*d);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(6) as usize;
    format!("{:.*}", decimals, value)
}

fn tick_labels(min: f64, max: f64, target: usize) -> Vec<(f64, String)> {
    let ticks = nice_ticks(min, max, target);
    let step = if max > min { tick_step(min, max, target) } else { 1.0 };
    ticks.into_iter().map(|t| (t, format_tick(t, step))).collect()
}

fn max_label_width(typeface: &Typeface, labels: &[(f64, String)], scale: Scale) -> f64 {
    labels.iter().map(|(_, l)| typeface.text_width(l, scale)).fold(0.0, f64::max)
}

#[derive(Clone, Copy)]
struct DrawStyle {
    alpha: f64,
    edge: Option<(Rgb, f64)>,
    marker_radius: f64,
    line_width: f64,
}

impl DrawStyle {
    fn from_options(options: &PlotOptions, with_edges: bool) -> Self {
        DrawStyle {
            alpha: options.alpha,
            edge: with_edges.then(|| (options.edgecolor, pt(options.linewidth))),
            marker_radius: options.markersize.max(0.0).sqrt() / 2.0 * DPI as f64 / 72.0,
            line_width: pt(1.5),
        }
    }
}

fn ring_pixels(viewport: &Viewport, ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords().map(|c| viewport.to_pixel(*c)).collect()
}

fn draw_polygon(canvas: &mut Canvas, viewport: &Viewport, polygon: &Polygon<f64>, fill: Rgb, style: &DrawStyle) {
    let rings: Vec<Vec<(f64, f64)>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|r| ring_pixels(viewport, r))
        .collect();

    canvas.fill_polygon(&rings, fill, style.alpha);
    if let Some((edge, width)) = style.edge {
        for ring in &rings {
            canvas.draw_path(ring, width, edge, style.alpha);
        }
    }
}

fn draw_geometry(canvas: &mut Canvas, viewport: &Viewport, geometry: &Geometry<f64>, fill: Rgb, style: &DrawStyle) {
    match geometry {
        Geometry::Point(p) => canvas.fill_circle(viewport.to_pixel(p.0), style.marker_radius, fill, style.alpha),
        Geometry::MultiPoint(mp) => {
            for p in mp {
                canvas.fill_circle(viewport.to_pixel(p.0), style.marker_radius, fill, style.alpha);
            }
        }
        Geometry::Line(line) => canvas.draw_line(
            viewport.to_pixel(line.start),
            viewport.to_pixel(line.end),
            style.line_width,
            fill,
            style.alpha,
        ),
        Geometry::LineString(ls) => canvas.draw_path(&ring_pixels(viewport, ls), style.line_width, fill, style.alpha),
        Geometry::MultiLineString(mls) => {
            for ls in mls {
                canvas.draw_path(&ring_pixels(viewport, ls), style.line_width, fill, style.alpha);
            }
        }
        Geometry::Polygon(polygon) => draw_polygon(canvas, viewport, polygon, fill, style),
        Geometry::MultiPolygon(mp) => {
            for polygon in mp {
                draw_polygon(canvas, viewport, polygon, fill, style);
            }
        }
        Geometry::Rect(rect) => draw_polygon(canvas, viewport, &rect.to_polygon(), fill, style),
        Geometry::Triangle(triangle) => draw_polygon(canvas, viewport, &triangle.to_polygon(), fill, style),
        Geometry::GeometryCollection(collection) => {
            for g in collection {
                draw_geometry(canvas, viewport, g, fill, style);
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Axes {
    Off,
    Framed { labels: bool, hide_top_right: bool },
}

#[derive(Clone, Copy, PartialEq)]
enum Placement {
    Right,
    Bottom,
}

struct Panel<'a> {
    title: &'a str,
    title_points: f64,
    axes: Axes,
    legend: &'a Legend,
    show_legend: bool,
    placement: Placement,
    /// Text under a horizontal colour bar.
    legend_label: Option<&'a str>,
}

fn inset(rect: PixelRect, by: f64) -> PixelRect {
    PixelRect {
        x: rect.x + by,
        y: rect.y + by,
        width: (rect.width - 2.0 * by).max(1.0),
        height: (rect.height - 2.0 * by).max(1.0),
    }
}

fn data_bounds(table: &SpatialTable) -> Rect<f64> {
    table
        .bounding_rect()
        .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }))
}

fn stroke_rect(canvas: &mut Canvas, rect: PixelRect, width: f64, color: Rgb) {
    let (x0, y0, x1, y1) = (rect.x, rect.y, rect.x + rect.width, rect.y + rect.height);
    canvas.draw_path(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)], width, color, 1.0);
}

fn legend_width(typeface: &Typeface, legend: &Legend) -> f64 {
    let scale = Typeface::scale_for_points(TICK_POINTS);
    match legend {
        Legend::None => 0.0,
        Legend::ColorBar { min, max, .. } => {
            pt(12.0) + pt(3.5) + pt(3.0) + max_label_width(typeface, &tick_labels(*min, *max, 5), scale)
        }
        Legend::Categories(entries) => {
            let widest = entries.iter().map(|(n, _)| typeface.text_width(n, scale)).fold(0.0, f64::max);
            pt(6.0) * 2.0 + typeface.text_height(scale) + pt(4.0) + widest
        }
    }
}

fn horizontal_bar_height(typeface: &Typeface, label: Option<&str>) -> f64 {
    let scale = Typeface::scale_for_points(TICK_POINTS);
    let label_height = label.map(|_| pt(4.0) + typeface.text_height(Typeface::scale_for_points(LABEL_POINTS))).unwrap_or(0.0);
    pt(12.0) + pt(3.5) + pt(3.0) + typeface.text_height(scale) + label_height
}

fn render_panel(canvas: &mut Canvas, area: PixelRect, table: &SpatialTable, styled: &Styled, style: &DrawStyle, panel: &Panel) {
    let pad = pt(8.0);
    let gap = pt(3.0);
    let tick_len = pt(3.5);
    let tick_scale = Typeface::scale_for_points(TICK_POINTS);
    let label_scale = Typeface::scale_for_points(LABEL_POINTS);
    let mut content = inset(area, pad);

    if !panel.title.is_empty() {
        let scale = Typeface::scale_for_points(panel.title_points);
        let width = canvas.typeface().text_width(panel.title, scale);
        canvas.draw_text(panel.title, (area.x + (area.width - width) / 2.0, content.y), scale, Rgb::BLACK, true);

        let used = canvas.typeface().text_height(scale) + pad;
        content.y += used;
        content.height = (content.height - used).max(1.0);
    }

    let has_legend = panel.show_legend && !matches!(panel.legend, Legend::None);
    let mut legend_rect = None;
    if has_legend {
        match panel.placement {
            Placement::Right => {
                let width = legend_width(canvas.typeface(), panel.legend);
                legend_rect = Some(PixelRect { x: content.x + content.width - width, width, ..content });
                content.width = (content.width - width - pad).max(1.0);
            }
            Placement::Bottom => {
                let height = horizontal_bar_height(canvas.typeface(), panel.legend_label);
                legend_rect = Some(PixelRect { y: content.y + content.height - height, height, ..content });
                content.height = (content.height - height - pad).max(1.0);
            }
        }
    }

    let bounds = data_bounds(table);
    let mut axes_rect = content;
    if let Axes::Framed { labels, .. } = panel.axes {
        let estimate = Viewport::fit(bounds, content, DATA_MARGIN).world_bounds();
        let y_labels = tick_labels(estimate.min().y, estimate.max().y, 6);
        let label_band = if labels { canvas.typeface().text_height(label_scale) + gap } else { 0.0 };

        let left = label_band + max_label_width(canvas.typeface(), &y_labels, tick_scale) + gap + tick_len;
        let bottom = tick_len + gap + canvas.typeface().text_height(tick_scale) + label_band;
        axes_rect = PixelRect {
            x: content.x + left,
            y: content.y,
            width: (content.width - left).max(1.0),
            height: (content.height - bottom).max(1.0),
        };
    }

    let viewport = Viewport::fit(bounds, axes_rect, DATA_MARGIN);
    for (feature, color) in table.iter().zip(&styled.colors) {
        if let Some(color) = color {
            draw_geometry(canvas, &viewport, &feature.geometry, *color, style);
        }
    }

    if let Axes::Framed { labels, hide_top_right } = panel.axes {
        draw_axes(canvas, &viewport, labels, hide_top_right);
    }

    if let Some(rect) = legend_rect {
        let frame = viewport.pixel_bounds();
        match (panel.legend, panel.placement) {
            (Legend::ColorBar { min, max, colormap }, Placement::Right) => {
                draw_vertical_colorbar(canvas, rect, frame, *min, *max, *colormap)
            }
            (Legend::ColorBar { min, max, colormap }, Placement::Bottom) => {
                draw_horizontal_colorbar(canvas, rect, *min, *max, *colormap, panel.legend_label)
            }
            (Legend::Categories(entries), _) => draw_categories(canvas, rect, frame, entries, style.alpha),
            (Legend::None, _) => {}
        }
    }
}

fn draw_axes(canvas: &mut Canvas, viewport: &Viewport, labels: bool, hide_top_right: bool) {
    let frame = viewport.pixel_bounds();
    let world = viewport.world_bounds();
    let (line, tick_len, gap) = (pt(0.8), pt(3.5), pt(3.0));
    let tick_scale = Typeface::scale_for_points(TICK_POINTS);
    let label_scale = Typeface::scale_for_points(LABEL_POINTS);
    let (left, top, right, bottom) = (frame.x, frame.y, frame.x + frame.width, frame.y + frame.height);

    canvas.draw_line((left, top), (left, bottom), line, Rgb::BLACK, 1.0);
    canvas.draw_line((left, bottom), (right, bottom), line, Rgb::BLACK, 1.0);
    if !hide_top_right {
        canvas.draw_line((left, top), (right, top), line, Rgb::BLACK, 1.0);
        canvas.draw_line((right, top), (right, bottom), line, Rgb::BLACK, 1.0);
    }

    for (value, label) in tick_labels(world.min().x, world.max().x, 6) {
        let x = left + (value - world.min().x) / world.width() * frame.width;
        canvas.draw_line((x, bottom), (x, bottom + tick_len), line, Rgb::BLACK, 1.0);
        let width = canvas.typeface().text_width(&label, tick_scale);
        canvas.draw_text(&label, (x - width / 2.0, bottom + tick_len + gap), tick_scale, Rgb::BLACK, false);
    }

    let y_labels = tick_labels(world.min().y, world.max().y, 6);
    for (value, label) in &y_labels {
        let y = bottom - (value - world.min().y) / world.height() * frame.height;
        canvas.draw_line((left - tick_len, y), (left, y), line, Rgb::BLACK, 1.0);
        let width = canvas.typeface().text_width(label, tick_scale);
        let origin = (left - tick_len - gap - width, y - canvas.typeface().text_height(tick_scale) / 2.0);
        canvas.draw_text(label, origin, tick_scale, Rgb::BLACK, false);
    }

    if labels {
        let x_label = "Longitude";
        let width = canvas.typeface().text_width(x_label, label_scale);
        let y = bottom + tick_len + gap + canvas.typeface().text_height(tick_scale) + gap;
        canvas.draw_text(x_label, (left + (frame.width - width) / 2.0, y), label_scale, Rgb::BLACK, false);

        let y_label = "Latitude";
        let length = canvas.typeface().text_width(y_label, label_scale);
        let widest = max_label_width(canvas.typeface(), &y_labels, tick_scale);
        let x = left - tick_len - gap - widest - gap - canvas.typeface().text_height(label_scale);
        canvas.draw_text_up(y_label, (x, top + (frame.height + length) / 2.0), label_scale, Rgb::BLACK);
    }
}

fn draw_vertical_colorbar(canvas: &mut Canvas, rect: PixelRect, frame: PixelRect, min: f64, max: f64, colormap: Colormap) {
    let bar = PixelRect { x: rect.x, y: frame.y, width: pt(12.0), height: frame.height };
    let rows = bar.height.round().max(1.0) as i64;

    for row in 0..rows {
        let t = 1.0 - (row as f64 + 0.5) / rows as f64;
        let strip = PixelRect { y: bar.y + row as f64, height: 1.0, ..bar };
        canvas.fill_rect(strip, colormap.evaluate(t), 1.0);
    }
    stroke_rect(canvas, bar, pt(0.8), Rgb::BLACK);

    let scale = Typeface::scale_for_points(TICK_POINTS);
    for (value, label) in tick_labels(min, max, 5) {
        let t = if max > min { (value - min) / (max - min) } else { 0.5 };
        let y = bar.y + bar.height * (1.0 - t);
        let right = bar.x + bar.width;
        canvas.draw_line((right, y), (right + pt(3.5), y), pt(0.8), Rgb::BLACK, 1.0);
        let half_height = canvas.typeface().text_height(scale) / 2.0;
        canvas.draw_text(&label, (right + pt(3.5) + pt(3.0), y - half_height), scale, Rgb::BLACK, false);
    }
}

fn draw_horizontal_colorbar(canvas: &mut Canvas, rect: PixelRect, min: f64, max: f64, colormap: Colormap, label: Option<&str>) {
    let bar = PixelRect { x: rect.x + rect.width * 0.1, y: rect.y, width: rect.width * 0.8, height: pt(12.0) };
    let columns = bar.width.round().max(1.0) as i64;

    for column in 0..columns {
        let t = (column as f64 + 0.5) / columns as f64;
        let strip = PixelRect { x: bar.x + column as f64, width: 1.0, ..bar };
        canvas.fill_rect(strip, colormap.evaluate(t), 1.0);
    }
    stroke_rect(canvas, bar, pt(0.8), Rgb::BLACK);

    let scale = Typeface::scale_for_points(TICK_POINTS);
    let bottom = bar.y + bar.height;
    for (value, text) in tick_labels(min, max, 5) {
        let t = if max > min { (value - min) / (max - min) } else { 0.5 };
        let x = bar.x + bar.width * t;
        canvas.draw_line((x, bottom), (x, bottom + pt(3.5)), pt(0.8), Rgb::BLACK, 1.0);
        let width = canvas.typeface().text_width(&text, scale);
        canvas.draw_text(&text, (x - width / 2.0, bottom + pt(3.5) + pt(3.0)), scale, Rgb::BLACK, false);
    }

    if let Some(label) = label {
        let label_scale = Typeface::scale_for_points(LABEL_POINTS);
        let width = canvas.typeface().text_width(label, label_scale);
        let y = bottom + pt(3.5) + pt(3.0) + canvas.typeface().text_height(scale) + pt(4.0);
        canvas.draw_text(label, (bar.x + (bar.width - width) / 2.0, y), label_scale, Rgb::BLACK, false);
    }
}

fn draw_categories(canvas: &mut Canvas, rect: PixelRect, frame: PixelRect, entries: &[(String, Rgb)], alpha: f64) {
    let scale = Typeface::scale_for_points(TICK_POINTS);
    let (pad, row) = (pt(6.0), canvas.typeface().text_height(scale) * 1.6);
    let swatch = canvas.typeface().text_height(scale);
    let height = pad * 2.0 + row * entries.len() as f64;
    let body = PixelRect { x: rect.x, y: frame.y, width: rect.width, height };

    canvas.fill_rect(body, Rgb::WHITE, 0.8);
    stroke_rect(canvas, body, pt(0.8), LEGEND_GRAY);

    for (i, (name, color)) in entries.iter().enumerate() {
        let y = body.y + pad + row * i as f64;
        canvas.fill_rect(PixelRect { x: body.x + pad, y, width: swatch, height: swatch }, *color, alpha);
        canvas.draw_text(name, (body.x + pad + swatch + pt(4.0), y), scale, Rgb::BLACK, false);
    }
}

fn render_single(table: &SpatialTable, options: &PlotOptions, axes: Axes, with_edges: bool) -> Result<Figure> {
    let styled = style_features(table, options.column.as_deref(), options.colormap)?;
    let mut figure = Figure::new(options.figsize, &options.title)?;
    let area = PixelRect { x: 0.0, y: 0.0, width: figure.width() as f64, height: figure.height() as f64 };

    let panel = Panel {
        title: &options.title,
        title_points: TITLE_POINTS,
        axes,
        legend: &styled.legend,
        show_legend: options.legend,
        placement: Placement::Right,
        legend_label: None,
    };
    render_panel(&mut figure.canvas, area, table, &styled, &DrawStyle::from_options(options, with_edges), &panel);

    figure.finish(options.output_path.as_deref())
}

/// Polygon map with longitude/latitude axes, outlines in `edgecolor`.
pub fn plot_polygons(table: &SpatialTable, options: &PlotOptions) -> Result<Figure> {
    render_single(table, options, Axes::Framed { labels: true, hide_top_right: true }, true)
}

/// Point map; markers are sized like matplotlib's `s`, in square points.
pub fn plot_points(table: &SpatialTable, options: &PlotOptions) -> Result<Figure> {
    render_single(table, options, Axes::Framed { labels: false, hide_top_right: false }, false)
}

pub fn plot_choropleth(table: &SpatialTable, value_column: &str, options: &ChoroplethOptions) -> Result<Figure> {
    let values = table.column_values(value_column)?;
    if values.iter().any(|v| !v.is_null() && v.as_f64().is_none()) {
        return Err(Error::Unsupported(format!("Column '{}' is not numeric", value_column)));
    }

    let styled = style_features(table, Some(value_column), options.colormap)?;
    let mut figure = Figure::new(options.figsize, &options.title)?;
    let area = PixelRect { x: 0.0, y: 0.0, width: figure.width() as f64, height: figure.height() as f64 };

    let style = DrawStyle { alpha: 1.0, edge: None, marker_radius: pt(2.5), line_width: pt(1.5) };
    let panel = Panel {
        title: &options.title,
        title_points: TITLE_POINTS,
        axes: Axes::Off,
        legend: &styled.legend,
        show_legend: true,
        placement: Placement::Bottom,
        legend_label: Some(value_column),
    };
    render_panel(&mut figure.canvas, area, table, &styled, &style, &panel);

    figure.finish(options.output_path.as_deref())
}

/// One panel per table, left to right. Panels without a title stay untitled.
pub fn create_comparison_map(
    tables: &[SpatialTable],
    titles: &[&str],
    figsize: (f64, f64),
    output_path: Option<&Path>,
) -> Result<Figure> {
    if tables.is_empty() {
        return Err(Error::EmptyInput("No tables to compare"));
    }

    let mut figure = Figure::new(figsize, &titles.join(" | "))?;
    let panel_width = figure.width() as f64 / tables.len() as f64;
    let style = DrawStyle { alpha: 0.7, edge: None, marker_radius: pt(2.5), line_width: pt(1.5) };

    for (i, table) in tables.iter().enumerate() {
        let styled = style_features(table, None, Colormap::default())?;
        let area = PixelRect { x: panel_width * i as f64, y: 0.0, width: panel_width, height: figure.height() as f64 };
        let panel = Panel {
            title: titles.get(i).copied().unwrap_or(""),
            title_points: PANEL_TITLE_POINTS,
            axes: Axes::Off,
            legend: &styled.legend,
            show_legend: false,
            placement: Placement::Right,
            legend_label: None,
        };
        render_panel(&mut figure.canvas, area, table, &styled, &style, &panel);
    }

    figure.finish(output_path)
}
