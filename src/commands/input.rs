use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{arg, ArgMatches};
use forest_viz::feature::SpatialTable;
use forest_viz::load::{find_geodatabase, find_vector_file, load_geodatabase, load_geojson, load_shapefile};

use crate::commands::required;


/// The positional input and the arguments narrowing it down.
pub fn input_args(command: clap::Command<'static>) -> clap::Command<'static> {
    command
        .arg(arg!(<INPUT> "Dataset directory, shapefile or GeoJSON file"))
        .arg(arg!(--file [NAME] "Shapefile name inside the directory, without .shp"))
        .arg(arg!(--layer [LAYER] "Geodatabase layer"))
}

pub fn load_from_args(args: &ArgMatches) -> anyhow::Result<SpatialTable> {
    load_input(&PathBuf::from(required(args, "INPUT")?), args.value_of("file"), args.value_of("layer"))
}

fn first_geojson(directory: &Path) -> Option<PathBuf> {
    ["*.geojson", "*.json", "*.geojson.gz"].iter().find_map(|pattern| {
        glob::glob(&directory.join(pattern).to_string_lossy())
            .ok()?
            .filter_map(|entry| entry.ok())
            .find(|path| path.is_file())
    })
}

/// Loads a shapefile, GeoJSON file or geodatabase, whichever `path` holds.
pub fn load_input(path: &Path, file: Option<&str>, layer: Option<&str>) -> anyhow::Result<SpatialTable> {
    if path.is_file() {
        let name = path.to_string_lossy().to_lowercase();
        if name.ends_with(".shp") {
            return Ok(load_shapefile(path)?);
        }
        if name.ends_with(".geojson") || name.ends_with(".json") || name.ends_with(".gz") {
            return Ok(load_geojson(path)?);
        }
        bail!("Don't know how to load {}", path.display());
    }

    if !path.is_dir() {
        bail!("Input path {} does not exist", path.display());
    }

    if path.extension().map_or(false, |e| e == "gdb") {
        let parent = path.parent().unwrap_or(path);
        return Ok(load_geodatabase(parent, layer)?);
    }

    match find_vector_file(path, file) {
        Ok(shapefile) => Ok(load_shapefile(&shapefile)?),
        Err(e) => {
            if file.is_none() {
                if let Some(geojson) = first_geojson(path) {
                    return Ok(load_geojson(&geojson)?);
                }
                if find_geodatabase(path).is_ok() {
                    return Ok(load_geodatabase(path, layer)?);
                }
            }
            Err(e.into())
        }
    }
}
