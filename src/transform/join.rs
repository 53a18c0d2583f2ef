use std::str::FromStr;

use geo::{Geometry, Relate};

use crate::error::{Error, Result};
use crate::feature::{Feature, Properties, PropertyValue, SpatialTable};

#[cfg(test)]
mod tests {
    use geo::{Geometry, Point};
    use rstest::rstest;

    use crate::crs::Crs;
    use crate::feature::{Feature, SpatialTable};
    use crate::test::harvest_units;
    use crate::transform::{spatial_join, JoinHow, Predicate};

    fn plots() -> SpatialTable {
        SpatialTable::from_features(
            Crs::CONUS_ALBERS,
            vec![
                Feature::new(Geometry::Point(Point::new(50.0, 50.0))).with_property("plot", "A").with_property("acres", 0.1),
                Feature::new(Geometry::Point(Point::new(550.0, 50.0))).with_property("plot", "B").with_property("acres", 0.2),
                Feature::new(Geometry::Point(Point::new(2000.0, 2000.0))).with_property("plot", "C").with_property("acres", 0.3),
            ],
        )
    }

    #[test]
    fn inner_join_pairs_matching_rows() {
        let joined = spatial_join(&harvest_units(), &plots(), JoinHow::Inner, Predicate::Intersects).unwrap();

        assert_eq!(2, joined.len());
        assert_eq!(vec!["kind", "acres_left", "index_right", "plot", "acres_right"], joined.columns().to_vec());
        assert_eq!(Some("A"), joined[0].get("plot").as_str());
        assert_eq!(Some(0.0), joined[0].get("index_right").as_f64());
        assert_eq!(Some(2.5), joined[0].get("acres_left").as_f64());
        assert_eq!(Some(0.2), joined[1].get("acres_right").as_f64());
        assert_eq!(harvest_units()[1].geometry, joined[1].geometry);
    }

    #[test]
    fn left_join_keeps_unmatched_rows() {
        let joined = spatial_join(&harvest_units(), &plots(), JoinHow::Left, Predicate::Contains).unwrap();

        assert_eq!(3, joined.len());
        assert!(joined[2].get("plot").is_null());
        assert!(joined[2].get("index_right").is_null());
        assert_eq!(Some("Clearcut"), joined[2].get("kind").as_str());
    }

    #[test]
    fn right_join_keeps_the_right_geometry() {
        let joined = spatial_join(&harvest_units(), &plots(), JoinHow::Right, Predicate::Intersects).unwrap();

        assert_eq!(3, joined.len());
        assert!(joined.has_column("index_left"));
        assert!(!joined.has_column("index_right"));
        assert_eq!(plots()[2].geometry, joined[2].geometry);
        assert!(joined[2].get("kind").is_null());
        assert_eq!(Some(1.0), joined[1].get("index_left").as_f64());
    }

    #[rstest]
    #[case(Predicate::Within, 2)]
    #[case(Predicate::Contains, 0)]
    fn predicates_are_evaluated_left_to_right(#[case] predicate: Predicate, #[case] expected: usize) {
        let joined = spatial_join(&plots(), &harvest_units(), JoinHow::Inner, predicate).unwrap();
        assert_eq!(expected, joined.len());
    }

    #[test]
    fn right_table_is_reprojected() {
        let wgs84_plots = plots().to_crs(Crs::WGS84).unwrap();
        let joined = spatial_join(&harvest_units(), &wgs84_plots, JoinHow::Inner, Predicate::Intersects).unwrap();

        assert_eq!(Crs::CONUS_ALBERS, joined.crs());
        assert_eq!(2, joined.len());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinHow {
    Inner,
    Left,
    Right,
}

impl FromStr for JoinHow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "inner" => Ok(JoinHow::Inner),
            "left" => Ok(JoinHow::Left),
            "right" => Ok(JoinHow::Right),
            _ => Err(Error::Unsupported(format!("Join type must be 'inner', 'left' or 'right', got '{}'", s))),
        }
    }
}

/// Spatial relation tested as `predicate(left, right)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
    Intersects,
    Contains,
    Within,
}

impl Predicate {
    pub fn evaluate(&self, left: &Geometry<f64>, right: &Geometry<f64>) -> bool {
        let matrix = left.relate(right);
        match self {
            Predicate::Intersects => matrix.is_intersects(),
            Predicate::Contains => matrix.is_contains(),
            Predicate::Within => matrix.is_within(),
        }
    }
}

impl FromStr for Predicate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "intersects" => Ok(Predicate::Intersects),
            "contains" => Ok(Predicate::Contains),
            "within" => Ok(Predicate::Within),
            _ => Err(Error::Unsupported(format!("Predicate must be 'intersects', 'contains' or 'within', got '{}'", s))),
        }
    }
}

/// Output column names of one input side.
struct SideColumns {
    renamed: Vec<(String, String)>,
}

impl SideColumns {
    fn new(own: &[String], other: &[String], suffix: &str) -> Self {
        let renamed = own
            .iter()
            .map(|c| {
                let name = if other.contains(c) { format!("{}_{}", c, suffix) } else { c.clone() };
                (c.clone(), name)
            })
            .collect();
        SideColumns { renamed }
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        self.renamed.iter().map(|(_, name)| name)
    }

    fn copy_into(&self, feature: Option<&Feature>, properties: &mut Properties) {
        for (source, target) in &self.renamed {
            let value = feature.map(|f| f.get(source).clone()).unwrap_or(PropertyValue::Null);
            properties.insert(target.clone(), value);
        }
    }
}

/// Attribute join of two tables by a spatial predicate.
///
/// `right` is brought into the CRS of `left` first. Inner and left joins
/// keep the left geometry and add `index_right`, right joins keep the right
/// geometry and add `index_left`. Clashing column names get `_left` and
/// `_right` suffixes.
pub fn spatial_join(left: &SpatialTable, right: &SpatialTable, how: JoinHow, predicate: Predicate) -> Result<SpatialTable> {
    let right = right.to_crs(left.crs())?;

    let left_columns = SideColumns::new(left.columns(), right.columns(), "left");
    let right_columns = SideColumns::new(right.columns(), left.columns(), "right");
    let index_column = match how {
        JoinHow::Right => "index_left",
        JoinHow::Inner | JoinHow::Left => "index_right",
    };

    let mut columns: Vec<String> = Vec::new();
    columns.extend(left_columns.names().cloned());
    columns.push(index_column.to_string());
    columns.extend(right_columns.names().cloned());

    let mut joined = SpatialTable::new(left.crs(), columns);

    let mut emit = |geometry: &Geometry<f64>, l: Option<&Feature>, r: Option<&Feature>, index: Option<usize>| {
        let mut properties = Properties::new();
        left_columns.copy_into(l, &mut properties);
        right_columns.copy_into(r, &mut properties);
        properties.insert(
            index_column.to_string(),
            index.map(|i| PropertyValue::Number(i as f64)).unwrap_or(PropertyValue::Null),
        );
        joined.push(Feature { geometry: geometry.clone(), properties });
    };

    match how {
        JoinHow::Inner | JoinHow::Left => {
            for l in left.iter() {
                let mut matched = false;
                for (j, r) in right.iter().enumerate() {
                    if predicate.evaluate(&l.geometry, &r.geometry) {
                        matched = true;
                        emit(&l.geometry, Some(l), Some(r), Some(j));
                    }
                }
                if !matched && how == JoinHow::Left {
                    emit(&l.geometry, Some(l), None, None);
                }
            }
        }
        JoinHow::Right => {
            for r in right.iter() {
                let mut matched = false;
                for (i, l) in left.iter().enumerate() {
                    if predicate.evaluate(&l.geometry, &r.geometry) {
                        matched = true;
                        emit(&r.geometry, Some(l), Some(r), Some(i));
                    }
                }
                if !matched {
                    emit(&r.geometry, None, Some(r), None);
                }
            }
        }
    }

    Ok(joined)
}
