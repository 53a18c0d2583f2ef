use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::bufread::GzDecoder;
use geo::Geometry;
use geojson::GeoJson;
use tracing::debug;

use crate::crs::Crs;
use crate::error::{Error, Result};
use crate::feature::{Feature, Properties, PropertyValue, SpatialTable};


/// Reads a GeoJSON document (optionally gzip compressed) into a table in EPSG:4326.
pub fn load_geojson(path: &Path) -> Result<SpatialTable> {
    if !path.is_file() {
        return Err(Error::NotFound(format!("GeoJSON file not found: {}", path.display())));
    }

    let file = File::open(path)?;
    let buf = BufReader::new(file);

    let is_gzipped = path.to_string_lossy().ends_with(".gz");
    let reader: Box<dyn Read> = if is_gzipped { Box::new(GzDecoder::new(buf)) } else { Box::new(buf) };

    let geojson_features = match serde_json::from_reader::<_, GeoJson>(reader)? {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature::from(g)],
    };
    let total = geojson_features.len();

    let mut table = SpatialTable::new(Crs::WGS84, Vec::new());
    for f in geojson_features {
        let gj_geo = match f.geometry {
            Some(g) => g,
            None => continue,
        };
        let geometry = Geometry::<f64>::try_from(gj_geo)?;

        let properties: Properties = match f.properties {
            Some(map) => map.into_iter().map(|(key, val)| (key, PropertyValue::from(val))).collect(),
            None => Properties::new(),
        };

        table.push(Feature { geometry, properties });
    }

    debug!("{} of {} GeoJSON features had a geometry", table.len(), total);

    Ok(table)
}
