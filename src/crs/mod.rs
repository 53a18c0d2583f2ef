mod wkt;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use geo::{Coord, Geometry, MapCoords};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::error::{Error, Result};

pub use wkt::{identify_prj, parse_wkt, WktItem, WktNode};


/// A coordinate reference system identified by its EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs(u32);

impl Crs {
    pub const WGS84: Crs = Crs(4326);
    pub const NAD83: Crs = Crs(4269);
    /// NAD83 / Conus Albers, the equal-area system used for areas and buffers
    pub const CONUS_ALBERS: Crs = Crs(5070);
    pub const WEB_MERCATOR: Crs = Crs(3857);

    pub const fn new(epsg: u32) -> Self {
        Crs(epsg)
    }

    pub fn epsg(&self) -> u32 {
        self.0
    }

    pub fn proj_string(&self) -> Option<&'static str> {
        match self.0 {
            4326 => Some("+proj=longlat +datum=WGS84 +no_defs"),
            4269 => Some("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs"),
            5070 => Some("+proj=aea +lat_0=23 +lon_0=-96 +lat_1=29.5 +lat_2=45.5 +x_0=0 +y_0=0 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs"),
            3857 => Some("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"),
            code => u16::try_from(code)
                .ok()
                .and_then(crs_definitions::from_code)
                .map(|def| def.proj4),
        }
    }

    /// Longitude/latitude systems take degrees, proj4rs wants radians for them.
    pub fn is_geographic(&self) -> bool {
        match self.proj_string() {
            Some(s) => s.contains("+proj=longlat"),
            None => (4000..5000).contains(&self.0),
        }
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::WGS84
    }
}

impl Display for Crs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Crs {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let code = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("epsg:"))
            .and_then(|_| trimmed[5..].parse::<u32>().ok())
            .ok_or_else(|| Error::Projection(format!("'{}' is not an EPSG:<code> identifier", s)))?;

        Ok(Crs(code))
    }
}

/// Transforms coordinates between two reference systems.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    source: Proj,
    target: Proj,
}

impl Reprojector {
    pub fn new(from: Crs, to: Crs) -> Result<Self> {
        Ok(Reprojector {
            from,
            to,
            source: build_proj(from)?,
            target: build_proj(to)?,
        })
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    pub fn project_coord(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        if self.is_identity() {
            return Ok(c);
        }

        let mut point = if self.from.is_geographic() {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };

        transform(&self.source, &self.target, &mut point)
            .map_err(|e| Error::Projection(format!("{} -> {}: {:?}", self.from, self.to, e)))?;

        if self.to.is_geographic() {
            Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
        } else {
            Ok(Coord { x: point.0, y: point.1 })
        }
    }

    pub fn project_geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(|c| self.project_coord(c))
    }
}

fn build_proj(crs: Crs) -> Result<Proj> {
    let definition = crs
        .proj_string()
        .ok_or_else(|| Error::Projection(format!("{} is not in the crs-definitions database", crs)))?;

    Proj::from_proj_string(definition)
        .map_err(|e| Error::Projection(format!("invalid definition for {}: {:?}", crs, e)))
}
