use std::fs::DirBuilder;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use geo::{Geometry, LineString, Point, Polygon};
use tempdir::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::crs::Crs;
use crate::feature::{Feature, SpatialTable};

pub fn with_input_and_output_paths(f: fn(PathBuf, PathBuf) -> ()) -> std::io::Result<()> {
    let dir = TempDir::new("forest-viz-in")?;
    let temp_dir_path = dir.path();
    let input_path = temp_dir_path.join("input");
    let output_path = temp_dir_path.join("output");
    DirBuilder::new().create(&input_path)?;
    DirBuilder::new().create(&output_path)?;

    f(input_path, output_path);

    dir.close()
}

/// An in-memory zip archive holding the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Axis-aligned square polygon with its lower left corner at (x, y).
pub fn square(x: f64, y: f64, size: f64) -> Geometry<f64> {
    Geometry::Polygon(Polygon::new(
        LineString::from(vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]),
        vec![],
    ))
}

/// Three 100m squares in Conus Albers with a `kind` and `acres` column.
pub fn harvest_units() -> SpatialTable {
    SpatialTable::from_features(
        Crs::CONUS_ALBERS,
        vec![
            Feature::new(square(0.0, 0.0, 100.0)).with_property("kind", "Clearcut").with_property("acres", 2.5),
            Feature::new(square(500.0, 0.0, 100.0)).with_property("kind", "Thinning").with_property("acres", 2.4),
            Feature::new(square(0.0, 500.0, 100.0)).with_property("kind", "Clearcut").with_property("acres", 2.6),
        ],
    )
}

/// Campground points in longitude/latitude.
pub fn campgrounds() -> SpatialTable {
    SpatialTable::from_features(
        Crs::WGS84,
        vec![
            Feature::new(Geometry::Point(Point::new(-105.2, 40.1))).with_property("name", "Aspen").with_property("sites", 12.0),
            Feature::new(Geometry::Point(Point::new(-105.6, 40.4))).with_property("name", "Pine").with_property("sites", 30.0),
        ],
    )
}
