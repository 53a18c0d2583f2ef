mod gdb;
mod geo_json;
mod shp;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::feature::SpatialTable;

pub use self::gdb::{find_geodatabase, load_geodatabase, select_layer};
pub use self::geo_json::load_geojson;
pub use self::shp::load_shapefile;

#[cfg(test)]
mod tests {
    use std::fs::File;

    use crate::error::Error;
    use crate::load::{find_vector_file, load_vector_file};
    use crate::test::with_input_and_output_paths;

    #[test]
    fn named_file_must_exist() {
        with_input_and_output_paths(|input_path, _| {
            match load_vector_file(&input_path, Some("Roads")) {
                Err(Error::NotFound(msg)) => assert!(msg.contains("Roads.shp")),
                other => panic!("unexpected {:?}", other),
            }
        })
        .unwrap();
    }

    #[test]
    fn empty_directory_has_no_shapefile() {
        with_input_and_output_paths(|input_path, _| {
            assert!(matches!(find_vector_file(&input_path, None), Err(Error::NotFound(_))));
        })
        .unwrap();
    }

    #[test]
    fn picks_the_shapefile_when_unnamed() {
        with_input_and_output_paths(|input_path, _| {
            File::create(input_path.join("readme.txt")).unwrap();
            File::create(input_path.join("Trails.shp")).unwrap();

            assert_eq!(input_path.join("Trails.shp"), find_vector_file(&input_path, None).unwrap());
            assert_eq!(input_path.join("Trails.shp"), find_vector_file(&input_path, Some("Trails")).unwrap());
        })
        .unwrap();
    }
}

/// Resolves the `.shp` file inside an extracted dataset directory.
///
/// With a `name`, `<directory>/<name>.shp` must exist. Without one the
/// first `*.shp` found is used.
pub fn find_vector_file(directory: &Path, name: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = name {
        let path = directory.join(format!("{}.shp", name));
        return if path.is_file() {
            Ok(path)
        } else {
            Err(Error::NotFound(format!("Shapefile not found: {}", path.display())))
        };
    }

    let pattern = directory.join("*.shp");
    let first = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| Error::NotFound(format!("Invalid search pattern {}: {}", pattern.display(), e)))?
        .filter_map(|entry| entry.ok())
        .find(|path| path.is_file());

    first.ok_or_else(|| Error::NotFound(format!("No shapefile found in {}", directory.display())))
}

/// Loads the shapefile of an extracted dataset directory.
pub fn load_vector_file(directory: &Path, name: Option<&str>) -> Result<SpatialTable> {
    let path = find_vector_file(directory, name)?;
    let table = load_shapefile(&path)?;

    info!("Loaded {} features from {}", table.len(), path.display());
    Ok(table)
}
