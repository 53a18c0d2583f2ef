use serde::Serialize;

use crate::error::Result;
use crate::feature::SpatialTable;

#[cfg(test)]
mod tests {
    use crate::crs::Crs;
    use crate::error::Error;
    use crate::feature::{Feature, PropertyValue, SpatialTable};
    use crate::test::{harvest_units, square};
    use crate::transform::summary_statistics;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn describes_numeric_columns_only() {
        let stats = summary_statistics(&harvest_units(), None).unwrap();

        assert_eq!(1, stats.len());
        let acres = &stats[0];
        assert_eq!("acres", acres.column);
        assert_eq!(3, acres.count);
        assert!(approx(2.5, acres.mean));
        assert!(approx(0.1, acres.std));
        assert!(approx(2.4, acres.min));
        assert!(approx(2.45, acres.q25));
        assert!(approx(2.5, acres.median));
        assert!(approx(2.55, acres.q75));
        assert!(approx(2.6, acres.max));
    }

    #[test]
    fn nulls_are_ignored() {
        let table = SpatialTable::from_features(
            Crs::CONUS_ALBERS,
            vec![
                Feature::new(square(0.0, 0.0, 1.0)).with_property("v", 1.0),
                Feature::new(square(0.0, 0.0, 1.0)).with_property("v", PropertyValue::Null),
                Feature::new(square(0.0, 0.0, 1.0)).with_property("v", 4.0),
            ],
        );
        let stats = summary_statistics(&table, Some(&["v"][..])).unwrap();

        assert_eq!(2, stats[0].count);
        assert!(approx(1.75, stats[0].q25));
    }

    #[test]
    fn single_value_has_no_deviation() {
        let table = SpatialTable::from_features(Crs::WGS84, vec![Feature::new(square(0.0, 0.0, 1.0)).with_property("v", 3.0)]);
        let stats = summary_statistics(&table, None).unwrap();

        assert!(stats[0].std.is_nan());
        assert!(approx(3.0, stats[0].median));
    }

    #[test]
    fn requested_columns_must_exist() {
        let res = summary_statistics(&harvest_units(), Some(&["acres", "volume"][..]));
        assert!(matches!(res, Err(Error::ColumnNotFound(c)) if c == "volume"));
    }
}

/// Descriptive statistics of one numeric column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// sample standard deviation, NaN below two values
    pub std: f64,
    pub min: f64,
    #[serde(rename = "25%")]
    pub q25: f64,
    #[serde(rename = "50%")]
    pub median: f64,
    #[serde(rename = "75%")]
    pub q75: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn from_values(column: &str, mut values: Vec<f64>) -> Self {
        values.sort_by(|a, b| a.total_cmp(b));
        let count = values.len();
        let n = count as f64;

        let mean = values.iter().sum::<f64>() / n;
        let std = if count > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };

        ColumnSummary {
            column: column.to_string(),
            count,
            mean,
            std,
            min: values.first().copied().unwrap_or(f64::NAN),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Linear interpolation between the closest ranks of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Statistics for `columns`, or for every numeric column when `None`.
pub fn summary_statistics(table: &SpatialTable, columns: Option<&[&str]>) -> Result<Vec<ColumnSummary>> {
    let columns: Vec<String> = match columns {
        Some(requested) => {
            for column in requested {
                table.require_column(column)?;
            }
            requested.iter().map(|c| c.to_string()).collect()
        }
        None => table.numeric_columns(),
    };

    Ok(columns
        .iter()
        .map(|column| {
            let values = table.iter().filter_map(|f| f.get(column).as_f64()).collect();
            ColumnSummary::from_values(column, values)
        })
        .collect())
}
