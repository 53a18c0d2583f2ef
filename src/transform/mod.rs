mod export;
mod filter;
mod join;
mod measure;
mod merge;
mod stats;

pub use export::{export_to_geojson, to_feature_collection};
pub use filter::{filter_by_attribute, filter_by_bounds, AttributeFilter, BoundingBox};
pub use join::{spatial_join, JoinHow, Predicate};
pub use measure::{calculate_area, create_buffer, AreaUnit, DistanceUnit};
pub use merge::{merge, MergeHow};
pub use stats::{summary_statistics, ColumnSummary};
