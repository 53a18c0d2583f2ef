use geo::{Geometry, Intersects, Rect};

use crate::error::Result;
use crate::feature::{PropertyValue, SpatialTable};


/// Value test applied by [`filter_by_attribute`].
#[derive(Clone, Debug)]
pub enum AttributeFilter {
    Value(PropertyValue),
    AnyOf(Vec<PropertyValue>),
}

impl AttributeFilter {
    pub fn matches(&self, value: &PropertyValue) -> bool {
        match self {
            AttributeFilter::Value(v) => v == value,
            AttributeFilter::AnyOf(values) => values.iter().any(|v| v == value),
        }
    }
}

impl From<PropertyValue> for AttributeFilter {
    fn from(value: PropertyValue) -> Self {
        AttributeFilter::Value(value)
    }
}

impl From<&str> for AttributeFilter {
    fn from(value: &str) -> Self {
        AttributeFilter::Value(value.into())
    }
}

impl From<f64> for AttributeFilter {
    fn from(value: f64) -> Self {
        AttributeFilter::Value(value.into())
    }
}

/// An axis-aligned box in the coordinates of the table it filters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox { min_x, min_y, max_x, max_y }
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new((self.min_x, self.min_y), (self.max_x, self.max_y))
    }
}

pub fn filter_by_attribute(table: &SpatialTable, column: &str, filter: &AttributeFilter) -> Result<SpatialTable> {
    table.require_column(column)?;

    Ok(table.filter(|f| filter.matches(f.get(column))))
}

pub fn filter_by_bounds(table: &SpatialTable, bbox: &BoundingBox) -> SpatialTable {
    let area = Geometry::Rect(bbox.to_rect());

    table.filter(|f| f.geometry.intersects(&area))
}
