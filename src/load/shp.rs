use std::convert::TryFrom;
use std::fs::read_to_string;
use std::path::Path;

use geo::Geometry;
use shapefile::dbase::{FieldValue, Reader as DbaseReader};
use shapefile::{Reader, Shape};
use tracing::warn;

use crate::crs::{identify_prj, Crs};
use crate::error::{Error, Result};
use crate::feature::{Feature, Properties, PropertyValue, SpatialTable};

#[cfg(test)]
mod tests {
    use std::convert::TryInto;
    use std::fs::{read, write};
    use std::path::Path;

    use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
    use shapefile::{Point, Writer};

    use crate::crs::Crs;
    use crate::load::load_shapefile;
    use crate::test::with_input_and_output_paths;

    fn write_campgrounds(path: &Path) {
        let table = TableWriterBuilder::new()
            .add_character_field("NAME".try_into().unwrap(), 32)
            .add_numeric_field("SITES".try_into().unwrap(), 10, 0);
        let mut writer = Writer::from_path(path, table).unwrap();

        for (x, y, name, sites) in [(-105.2, 40.1, "Aspen", 12.0), (-105.6, 40.4, "Pine", 30.0)] {
            let mut record = Record::default();
            record.insert("NAME".to_string(), FieldValue::Character(Some(name.to_string())));
            record.insert("SITES".to_string(), FieldValue::Numeric(Some(sites)));
            writer.write_shape_and_record(&Point::new(x, y), &record).unwrap();
        }
    }

    #[test]
    fn reads_points_and_attributes() {
        with_input_and_output_paths(|input_path, _| {
            let path = input_path.join("Campgrounds.shp");
            write_campgrounds(&path);

            let table = load_shapefile(&path).unwrap();

            assert_eq!(2, table.len());
            assert_eq!(vec!["NAME".to_string(), "SITES".to_string()], table.columns().to_vec());
            assert_eq!(Some("Pine"), table[1].get("NAME").as_str());
            assert_eq!(Some(12.0), table[0].get("SITES").as_f64());
            assert_eq!(Crs::WGS84, table.crs());
        })
        .unwrap();
    }

    #[test]
    fn records_with_null_shapes_are_skipped() {
        with_input_and_output_paths(|input_path, _| {
            let path = input_path.join("Campgrounds.shp");
            write_campgrounds(&path);

            // the first record's shape type sits after the 100 byte file
            // header and the 8 byte record header
            let mut bytes = read(&path).unwrap();
            bytes[108..112].copy_from_slice(&0i32.to_le_bytes());
            write(&path, bytes).unwrap();

            let table = load_shapefile(&path).unwrap();

            assert_eq!(1, table.len());
            assert_eq!(Some("Pine"), table[0].get("NAME").as_str());
        })
        .unwrap();
    }

    #[test]
    fn uses_the_prj_sidecar() {
        with_input_and_output_paths(|input_path, _| {
            let path = input_path.join("Campgrounds.shp");
            write_campgrounds(&path);
            write(
                input_path.join("Campgrounds.prj"),
                r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#,
            )
            .unwrap();

            assert_eq!(Crs::NAD83, load_shapefile(&path).unwrap().crs());
        })
        .unwrap();
    }
}

/// Reads a shapefile with its dBase attributes.
///
/// The CRS comes from the sibling `.prj`; unknown or missing definitions
/// fall back to EPSG:4326.
pub fn load_shapefile(path: &Path) -> Result<SpatialTable> {
    let crs = read_prj(path);
    let columns = read_columns(path)?;
    let mut table = SpatialTable::new(crs, columns);

    let mut reader = Reader::from_path(path)?;
    let mut skipped = 0;

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        if let Shape::NullShape = shape {
            skipped += 1;
            continue;
        }

        let geometry = Geometry::<f64>::try_from(shape)
            .map_err(|e| Error::Unsupported(format!("{}: {}", path.display(), e)))?;

        let properties: Properties =
            record.into_iter().map(|(name, value)| (name, field_to_property(value))).collect();

        table.push(Feature { geometry, properties });
    }

    if skipped > 0 {
        warn!("Skipped {} records without geometry in {}", skipped, path.display());
    }

    Ok(table)
}

fn read_columns(path: &Path) -> Result<Vec<String>> {
    let dbf = path.with_extension("dbf");
    let reader = DbaseReader::from_path(&dbf).map_err(shapefile::Error::DbaseError)?;

    Ok(reader.fields().iter().map(|field| field.name().to_string()).collect())
}

fn read_prj(path: &Path) -> Crs {
    let prj = path.with_extension("prj");
    let text = match read_to_string(&prj) {
        Ok(text) => text,
        Err(_) => return Crs::default(),
    };

    match identify_prj(&text) {
        Some(crs) => crs,
        None => {
            warn!("Unrecognised projection in {}, assuming {}", prj.display(), Crs::default());
            Crs::default()
        }
    }
}

fn field_to_property(value: FieldValue) -> PropertyValue {
    match value {
        FieldValue::Character(Some(s)) => PropertyValue::String(s.trim_end().to_string()),
        FieldValue::Numeric(Some(n)) => PropertyValue::Number(n),
        FieldValue::Float(Some(n)) => PropertyValue::Number(n as f64),
        FieldValue::Integer(n) => PropertyValue::Number(n as f64),
        FieldValue::Double(n) => PropertyValue::Number(n),
        FieldValue::Currency(n) => PropertyValue::Number(n),
        FieldValue::Logical(Some(b)) => PropertyValue::Bool(b),
        FieldValue::Date(Some(d)) => {
            PropertyValue::String(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day()))
        }
        FieldValue::Memo(s) => PropertyValue::String(s),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => PropertyValue::Null,
        other => PropertyValue::String(format!("{:?}", other)),
    }
}
