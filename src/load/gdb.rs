use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::feature::SpatialTable;


/// First `*.gdb` directory inside an extracted geodatabase archive.
pub fn find_geodatabase(directory: &Path) -> Result<PathBuf> {
    let pattern = directory.join("*.gdb");
    let first = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| Error::NotFound(format!("Invalid search pattern {}: {}", pattern.display(), e)))?
        .filter_map(|entry| entry.ok())
        .find(|path| path.is_dir());

    first.ok_or_else(|| Error::NotFound(format!("No geodatabase found in {}", directory.display())))
}

/// Picks `requested` out of the available layer names, or the first one.
pub fn select_layer<'a>(available: &'a [String], requested: Option<&str>) -> Result<&'a str> {
    let first = available
        .first()
        .ok_or_else(|| Error::NotFound("No layers found in geodatabase".to_string()))?;

    match requested {
        None => Ok(first),
        Some(layer) => available
            .iter()
            .find(|name| name.as_str() == layer)
            .map(|name| name.as_str())
            .ok_or_else(|| Error::LayerNotFound {
                layer: layer.to_string(),
                available: available.to_vec(),
            }),
    }
}

#[cfg(feature = "gdal")]
pub fn load_geodatabase(directory: &Path, layer: Option<&str>) -> Result<SpatialTable> {
    use gdal::vector::{FieldValue, LayerAccess};
    use gdal::Dataset;
    use tracing::info;

    use crate::crs::Crs;
    use crate::feature::{Feature, Properties, PropertyValue};

    let gdb_path = find_geodatabase(directory)?;
    let dataset = Dataset::open(&gdb_path)?;

    let available: Vec<String> = dataset.layers().map(|l| l.name()).collect();
    let layer_name = select_layer(&available, layer)?.to_string();
    let mut gdal_layer = dataset.layer_by_name(&layer_name)?;

    let crs = gdal_layer
        .spatial_ref()
        .and_then(|srs| srs.auth_code().ok())
        .map(|code| Crs::new(code as u32))
        .unwrap_or_default();
    let columns: Vec<String> = gdal_layer.defn().fields().map(|f| f.name()).collect();
    let mut table = SpatialTable::new(crs, columns);

    for feature in gdal_layer.features() {
        let geometry = match feature.geometry() {
            Some(g) => g.to_geo()?,
            None => continue,
        };

        let properties: Properties = feature
            .fields()
            .map(|(name, value)| {
                let value = match value {
                    None => PropertyValue::Null,
                    Some(FieldValue::IntegerValue(n)) => PropertyValue::Number(n as f64),
                    Some(FieldValue::Integer64Value(n)) => PropertyValue::Number(n as f64),
                    Some(FieldValue::RealValue(n)) => PropertyValue::Number(n),
                    Some(FieldValue::StringValue(s)) => PropertyValue::String(s),
                    Some(FieldValue::DateValue(d)) => PropertyValue::String(d.to_string()),
                    Some(FieldValue::DateTimeValue(d)) => PropertyValue::String(d.date_naive().to_string()),
                    Some(other) => PropertyValue::String(format!("{:?}", other)),
                };
                (name, value)
            })
            .collect();

        table.push(Feature { geometry, properties });
    }

    info!("Loaded layer '{}' ({} features) from {}", layer_name, table.len(), gdb_path.display());
    Ok(table)
}

/// Reading File Geodatabases needs GDAL, enabled through the `gdal` feature.
#[cfg(not(feature = "gdal"))]
pub fn load_geodatabase(directory: &Path, _layer: Option<&str>) -> Result<SpatialTable> {
    let gdb_path = find_geodatabase(directory)?;

    Err(Error::Unsupported(format!(
        "Cannot read {}: forest-viz was built without the 'gdal' feature",
        gdb_path.display()
    )))
}
