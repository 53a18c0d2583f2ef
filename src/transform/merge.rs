use std::str::FromStr;

use crate::error::{Error, Result};
use crate::feature::SpatialTable;


/// Which columns survive a [`merge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeHow {
    /// every column of every input, missing values read as null
    Union,
    /// only the columns all inputs have
    Intersection,
}

impl FromStr for MergeHow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "union" => Ok(MergeHow::Union),
            "intersection" => Ok(MergeHow::Intersection),
            _ => Err(Error::Unsupported(format!("Merge mode must be 'union' or 'intersection', got '{}'", s))),
        }
    }
}

/// Concatenates the rows of all tables in input order, in the CRS of the first.
pub fn merge(tables: &[SpatialTable], how: MergeHow) -> Result<SpatialTable> {
    let first = tables.first().ok_or(Error::EmptyInput("No tables to merge"))?;
    if tables.len() == 1 {
        return Ok(first.clone());
    }

    let crs = first.crs();
    let columns: Vec<String> = match how {
        MergeHow::Union => {
            let mut columns: Vec<String> = Vec::new();
            for column in tables.iter().flat_map(|t| t.columns()) {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
            columns
        }
        MergeHow::Intersection => first
            .columns()
            .iter()
            .filter(|c| tables.iter().all(|t| t.has_column(c)))
            .cloned()
            .collect(),
    };

    let mut merged = SpatialTable::new(crs, columns.clone());
    for table in tables {
        for mut feature in table.to_crs(crs)?.into_features() {
            if how == MergeHow::Intersection {
                feature.properties.retain(|key, _| columns.contains(key));
            }
            merged.push(feature);
        }
    }

    Ok(merged)
}
