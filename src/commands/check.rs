use std::fs::{create_dir_all, remove_file, write};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::ArgMatches;
use forest_viz::crs::{Crs, Reprojector};
use geo::Coord;

use crate::commands::{ForestVizCommand, Settings};


pub struct Check {}

impl ForestVizCommand for Check {
    fn get_description(&self) -> &'static str {
        "Check that the installation works."
    }

    fn exec(&self, settings: &Settings, _args: &ArgMatches) -> anyhow::Result<()> {
        let start = Instant::now();

        println!("▶️  Checking catalog");
        let datasets = settings.catalog.list();
        if datasets.is_empty() {
            bail!("The catalog has no datasets");
        }
        for name in &datasets {
            settings.catalog.info(name)?;
        }
        println!("✔️  Catalog lists {} datasets", datasets.len());

        println!("▶️  Checking projections");
        let albers = Reprojector::new(Crs::WGS84, Crs::CONUS_ALBERS)?.project_coord(Coord { x: -96.0, y: 23.0 })?;
        if albers.x.abs() > 1.0 || albers.y.abs() > 1.0 {
            bail!("Reprojection is off: expected the Conus Albers origin, got {:?}", albers);
        }
        println!("✔️  Projections work");

        println!("▶️  Checking data directory {}", settings.data_dir.display());
        create_dir_all(&settings.data_dir)
            .with_context(|| format!("Can't create data directory {}", settings.data_dir.display()))?;
        let marker = settings.data_dir.join(".forest-viz-check");
        write(&marker, b"ok").with_context(|| format!("Can't write to {}", settings.data_dir.display()))?;
        remove_file(&marker)?;
        println!("✔️  Data directory is writable");

        if cfg!(feature = "gdal") {
            println!("ℹ️  Geodatabase support enabled");
        } else {
            println!("ℹ️  Geodatabase support disabled, build with --features gdal to enable it");
        }

        println!("\n    🎉  All checks passed in {}ms", start.elapsed().as_millis());
        Ok(())
    }
}
