use std::ops::Deref;

use geo::{BoundingRect, Rect};

use crate::crs::{Crs, Reprojector};
use crate::error::{Error, Result};
use crate::feature::{Feature, PropertyValue};


/// An ordered collection of features sharing one CRS and one column set.
#[derive(Clone, Debug)]
pub struct SpatialTable {
    crs: Crs,
    columns: Vec<String>,
    features: Vec<Feature>,
}

impl Deref for SpatialTable {
    type Target = [Feature];

    fn deref(&self) -> &[Feature] {
        &self.features
    }
}

impl SpatialTable {
    pub fn new(crs: Crs, columns: Vec<String>) -> Self {
        SpatialTable { crs, columns, features: Vec::new() }
    }

    pub fn from_features(crs: Crs, features: Vec<Feature>) -> Self {
        let mut table = SpatialTable::new(crs, Vec::new());
        for feature in features {
            table.push(feature);
        }
        table
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(Error::ColumnNotFound(column.to_string()))
        }
    }

    pub fn add_column(&mut self, column: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
    }

    /// Appends a feature, registering any attribute names not seen before.
    pub fn push(&mut self, feature: Feature) {
        for key in feature.properties.keys() {
            if !self.has_column(key) {
                self.columns.push(key.clone());
            }
        }
        self.features.push(feature);
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<&PropertyValue>> {
        self.require_column(column)?;
        Ok(self.features.iter().map(|f| f.get(column)).collect())
    }

    /// Columns whose non-null values are all numbers (and has at least one).
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| {
                let mut values = self.features.iter().map(|f| f.get(column)).filter(|v| !v.is_null()).peekable();
                values.peek().is_some() && values.all(|v| v.as_f64().is_some())
            })
            .cloned()
            .collect()
    }

    /// Copy of the rows matching `predicate`, with the same CRS and columns.
    pub fn filter<F: Fn(&Feature) -> bool>(&self, predicate: F) -> SpatialTable {
        SpatialTable {
            crs: self.crs,
            columns: self.columns.clone(),
            features: self.features.iter().filter(|f| predicate(f)).cloned().collect(),
        }
    }

    pub fn to_crs(&self, crs: Crs) -> Result<SpatialTable> {
        if crs == self.crs {
            return Ok(self.clone());
        }

        let reprojector = Reprojector::new(self.crs, crs)?;
        let features = self
            .features
            .iter()
            .map(|f| {
                Ok(Feature {
                    geometry: reprojector.project_geometry(&f.geometry)?,
                    properties: f.properties.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SpatialTable { crs, columns: self.columns.clone(), features })
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|a, b| {
                Rect::new(
                    (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                    (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                )
            })
    }
}
