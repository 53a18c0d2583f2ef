use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::Path;

use geojson::{FeatureCollection, JsonObject};
use tracing::info;

use crate::crs::Crs;
use crate::error::Result;
use crate::feature::{Feature, SpatialTable};

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use geojson::GeoJson;

    use crate::crs::Crs;
    use crate::load::load_geojson;
    use crate::test::{harvest_units, with_input_and_output_paths};
    use crate::transform::{export_to_geojson, to_feature_collection};

    #[test]
    fn writes_a_wgs84_feature_collection() {
        with_input_and_output_paths(|_, output_path| {
            let path = output_path.join("nested").join("units.geojson");

            export_to_geojson(&harvest_units(), &path).unwrap();

            let text = read_to_string(&path).unwrap();
            assert!(matches!(text.parse::<GeoJson>().unwrap(), GeoJson::FeatureCollection(_)));

            let restored = load_geojson(&path).unwrap();
            assert_eq!(Crs::WGS84, restored.crs());
            assert_eq!(3, restored.len());
            assert_eq!(Some("Thinning"), restored[1].get("kind").as_str());
        })
        .unwrap();
    }

    #[test]
    fn null_attributes_are_kept_as_json_null() {
        let mut units = harvest_units();
        units.add_column("burned");

        let fc = to_feature_collection(&units);
        let props = fc.features[0].properties.as_ref().unwrap();

        assert_eq!(Some(&serde_json::Value::Null), props.get("burned"));
        assert_eq!(Some(&serde_json::json!(2.5)), props.get("acres"));
    }
}

fn to_geojson_feature(feature: &Feature, columns: &[String]) -> geojson::Feature {
    let properties: JsonObject = columns
        .iter()
        .map(|c| (c.clone(), serde_json::Value::from(feature.get(c))))
        .collect();

    geojson::Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&feature.geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// GeoJSON view of a table, coordinates as they are.
pub fn to_feature_collection(table: &SpatialTable) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: table.iter().map(|f| to_geojson_feature(f, table.columns())).collect(),
        foreign_members: None,
    }
}

/// Writes the table as a GeoJSON FeatureCollection in EPSG:4326.
pub fn export_to_geojson(table: &SpatialTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let wgs84 = table.to_crs(Crs::WGS84)?;
    let file = File::create(path)?;
    serde_json::to_writer(BufWriter::new(file), &to_feature_collection(&wgs84))?;

    info!("Exported {} features to {}", wgs84.len(), path.display());
    Ok(())
}
