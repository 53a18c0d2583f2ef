mod table;

use std::fmt::{Display, Formatter};

use geo::Geometry;
use indexmap::IndexMap;

pub use table::SpatialTable;


#[derive(Clone, Debug)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    String(String),
    Number(f64),
}

static NULL_VALUE: PropertyValue = PropertyValue::Null;

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "None"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(val: serde_json::Value) -> Self {
        match val {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(v),
            serde_json::Value::String(v) => Self::String(v),
            serde_json::Value::Number(v) => v.as_f64().map(Self::Number).unwrap_or(Self::Null),
            // nested values are kept as their JSON text
            other => Self::String(other.to_string()),
        }
    }
}

impl From<&PropertyValue> for serde_json::Value {
    fn from(val: &PropertyValue) -> Self {
        match val {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
            PropertyValue::String(s) => serde_json::Value::String(s.clone()),
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(val: &str) -> Self {
        PropertyValue::String(val.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(val: String) -> Self {
        PropertyValue::String(val)
    }
}

impl From<f64> for PropertyValue {
    fn from(val: f64) -> Self {
        PropertyValue::Number(val)
    }
}

impl From<i64> for PropertyValue {
    fn from(val: i64) -> Self {
        PropertyValue::Number(val as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(val: bool) -> Self {
        PropertyValue::Bool(val)
    }
}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(l0), Self::String(r0)) => l0 == r0,
            (Self::Number(l0), Self::Number(r0)) => l0 == r0,
            (Self::Bool(l0), Self::Bool(r0)) => l0 == r0,
            _ => false,
        }
    }
}

/// Attribute values of one row, in column order.
pub type Properties = IndexMap<String, PropertyValue>;

/// One row of a [`SpatialTable`].
#[derive(Clone, Debug)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Feature { geometry, properties: Properties::new() }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> &PropertyValue {
        self.properties.get(column).unwrap_or(&NULL_VALUE)
    }
}
