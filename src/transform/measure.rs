use std::f64::consts::PI;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use geo::{Area, Coord, Geometry, Line, LineString, MultiPolygon, Polygon};
use geo_clipper::{Clipper, EndType, JoinType};
use tracing::debug;

use crate::crs::{Crs, Reprojector};
use crate::error::{Error, Result};
use crate::feature::{Feature, PropertyValue, SpatialTable};

/// Clipper works on integers, coordinates are scaled to decimetres.
const CLIPPER_FACTOR: f64 = 10.0;
const ARC_TOLERANCE: f64 = 0.5;
const CIRCLE_SEGMENTS: usize = 64;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaUnit {
    SquareMeters,
    SquareKilometers,
    Acres,
    Hectares,
}

impl AreaUnit {
    pub const NAMES: &'static str = "sqm, sqkm, acres, hectares";

    pub fn name(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => "sqm",
            AreaUnit::SquareKilometers => "sqkm",
            AreaUnit::Acres => "acres",
            AreaUnit::Hectares => "hectares",
        }
    }

    pub fn from_square_meters(&self, sqm: f64) -> f64 {
        match self {
            AreaUnit::SquareMeters => sqm,
            AreaUnit::SquareKilometers => sqm * 1e-6,
            AreaUnit::Acres => sqm * 0.000247105,
            AreaUnit::Hectares => sqm * 0.0001,
        }
    }

    /// Name of the column added by [`calculate_area`].
    pub fn column_name(&self) -> String {
        format!("area_{}", self.name())
    }
}

impl Display for AreaUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AreaUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sqm" => Ok(AreaUnit::SquareMeters),
            "sqkm" => Ok(AreaUnit::SquareKilometers),
            "acres" => Ok(AreaUnit::Acres),
            "hectares" => Ok(AreaUnit::Hectares),
            _ => Err(Error::InvalidUnit { unit: s.to_string(), expected: AreaUnit::NAMES }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    pub const NAMES: &'static str = "meters, kilometers, miles, feet";

    pub fn to_meters(&self, distance: f64) -> f64 {
        match self {
            DistanceUnit::Meters => distance,
            DistanceUnit::Kilometers => distance * 1000.0,
            DistanceUnit::Miles => distance * 1609.34,
            DistanceUnit::Feet => distance * 0.3048,
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "meters" => Ok(DistanceUnit::Meters),
            "kilometers" => Ok(DistanceUnit::Kilometers),
            "miles" => Ok(DistanceUnit::Miles),
            "feet" => Ok(DistanceUnit::Feet),
            _ => Err(Error::InvalidUnit { unit: s.to_string(), expected: DistanceUnit::NAMES }),
        }
    }
}

/// Adds an `area_<unit>` column measured in Conus Albers (EPSG:5070).
pub fn calculate_area(table: &SpatialTable, unit: AreaUnit) -> Result<SpatialTable> {
    let projected = table.to_crs(Crs::CONUS_ALBERS)?;
    let column = unit.column_name();

    let mut result = SpatialTable::new(table.crs(), table.columns().to_vec());
    result.add_column(&column);

    for (original, measured) in table.iter().zip(projected.iter()) {
        let area = unit.from_square_meters(measured.geometry.unsigned_area());
        let mut feature = original.clone();
        feature.properties.insert(column.clone(), PropertyValue::Number(area));
        result.push(feature);
    }

    Ok(result)
}

/// Grows every geometry by `distance`, computed in Conus Albers and
/// returned in the table's CRS.
pub fn create_buffer(table: &SpatialTable, distance: f64, unit: DistanceUnit) -> Result<SpatialTable> {
    let meters = unit.to_meters(distance);
    if meters == 0.0 {
        return Ok(table.clone());
    }

    let to_albers = Reprojector::new(table.crs(), Crs::CONUS_ALBERS)?;
    let back = Reprojector::new(Crs::CONUS_ALBERS, table.crs())?;
    debug!("Buffering {} features by {}m", table.len(), meters);

    let mut result = SpatialTable::new(table.crs(), table.columns().to_vec());
    for feature in table.iter() {
        let projected = to_albers.project_geometry(&feature.geometry)?;
        let buffered = multi_to_geometry(buffer_geometry(&projected, meters));

        result.push(Feature {
            geometry: back.project_geometry(&buffered)?,
            properties: feature.properties.clone(),
        });
    }

    Ok(result)
}

fn buffer_geometry(geometry: &Geometry<f64>, meters: f64) -> MultiPolygon<f64> {
    let join = JoinType::Round(ARC_TOLERANCE);

    match geometry {
        // points and lines have no interior to shrink
        Geometry::Point(_) | Geometry::MultiPoint(_) | Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_)
            if meters < 0.0 =>
        {
            MultiPolygon::new(vec![])
        }
        Geometry::Point(p) => MultiPolygon::new(vec![disc(p.0, meters)]),
        Geometry::MultiPoint(mp) => union_all(mp.iter().map(|p| disc(p.0, meters)).collect()),
        Geometry::Line(l) => corridor(std::iter::once(*l), meters),
        Geometry::LineString(ls) => corridor(ls.lines(), meters),
        Geometry::MultiLineString(mls) => corridor(mls.iter().flat_map(|ls| ls.lines()), meters),
        Geometry::Polygon(p) => Clipper::offset(p, meters, join, EndType::ClosedPolygon, CLIPPER_FACTOR),
        Geometry::MultiPolygon(mp) => Clipper::offset(mp, meters, join, EndType::ClosedPolygon, CLIPPER_FACTOR),
        Geometry::Rect(r) => Clipper::offset(&r.to_polygon(), meters, join, EndType::ClosedPolygon, CLIPPER_FACTOR),
        Geometry::Triangle(t) => Clipper::offset(&t.to_polygon(), meters, join, EndType::ClosedPolygon, CLIPPER_FACTOR),
        Geometry::GeometryCollection(gc) => {
            union_all(gc.iter().flat_map(|g| buffer_geometry(g, meters).0).collect())
        }
    }
}

/// Round-capped buffer of a path: a rectangle along every segment plus a
/// disc on every vertex, unioned.
fn corridor(segments: impl Iterator<Item = Line<f64>>, meters: f64) -> MultiPolygon<f64> {
    let mut parts = Vec::new();
    let mut last_end = None;

    for segment in segments {
        if last_end != Some(segment.start) {
            parts.push(disc(segment.start, meters));
        }
        parts.push(disc(segment.end, meters));
        last_end = Some(segment.end);

        let (dx, dy) = (segment.dx(), segment.dy());
        let length = dx.hypot(dy);
        if length == 0.0 {
            continue;
        }

        let normal = Coord { x: -dy / length * meters, y: dx / length * meters };
        let ring = vec![
            segment.start - normal,
            segment.end - normal,
            segment.end + normal,
            segment.start + normal,
            segment.start - normal,
        ];
        parts.push(Polygon::new(LineString::from(ring), vec![]));
    }

    union_all(parts)
}

fn disc(center: Coord<f64>, radius: f64) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = (0..=CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = 2.0 * PI * (i % CIRCLE_SEGMENTS) as f64 / CIRCLE_SEGMENTS as f64;
            Coord { x: center.x + radius * angle.cos(), y: center.y + radius * angle.sin() }
        })
        .collect();

    Polygon::new(LineString::from(ring), vec![])
}

fn union_all(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    polygons
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, p| acc.union(&p, CLIPPER_FACTOR))
}

fn multi_to_geometry(mut mp: MultiPolygon<f64>) -> Geometry<f64> {
    if mp.0.len() == 1 {
        Geometry::Polygon(mp.0.remove(0))
    } else {
        Geometry::MultiPolygon(mp)
    }
}
