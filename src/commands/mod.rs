mod check;
mod clap_command;
mod datasets;
mod input;
mod map;
mod plot;
mod stats;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Arg, ArgMatches};
use forest_viz::catalog::{Catalog, CatalogParser};
use forest_viz::fetch::{ArchiveSource, HttpSource};

pub use check::Check;
pub use clap_command::ClapCommand;
pub use datasets::{Download, DownloadUrl, Info, List};
pub use map::Map;
pub use plot::Plot;
pub use stats::Stats;

pub trait ForestVizCommand {
    fn get_description(&self) -> &'static str;

    /// Adds the subcommand's own arguments.
    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        command
    }

    fn exec(&self, settings: &Settings, args: &ArgMatches) -> anyhow::Result<()>;
}

/// Builds the source a download talks to.
pub type SourceFactory = fn() -> forest_viz::Result<Box<dyn ArchiveSource>>;

pub fn http_source() -> forest_viz::Result<Box<dyn ArchiveSource>> {
    Ok(Box::new(HttpSource::new()?))
}

/// Everything a command needs besides its own arguments.
pub struct Settings {
    pub data_dir: PathBuf,
    pub catalog: Catalog,
    pub show_progress: bool,
}

impl Settings {
    pub fn global_args() -> Vec<Arg<'static>> {
        vec![
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .env("FOREST_VIZ_DATA_DIR")
                .default_value("data")
                .global(true)
                .help("Directory downloads are extracted to"),
            Arg::new("catalog")
                .long("catalog")
                .value_name("JSON")
                .takes_value(true)
                .global(true)
                .help("Dataset catalog to use instead of the built-in USDA EDW one"),
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .help("No progress bars, warnings and errors only"),
        ]
    }

    pub fn from_matches(matches: &ArgMatches, catalog_parser: &dyn CatalogParser) -> anyhow::Result<Self> {
        let catalog = match matches.value_of("catalog") {
            Some(path) => catalog_parser
                .parse(&PathBuf::from(path))
                .with_context(|| format!("Couldn't load catalog {}", path))?,
            None => Catalog::usda_edw(),
        };

        Ok(Settings {
            data_dir: PathBuf::from(matches.value_of("data-dir").unwrap_or("data")),
            catalog,
            show_progress: !matches.is_present("quiet"),
        })
    }
}

pub(crate) fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    args.value_of(name).ok_or_else(|| anyhow!("Missing argument {}", name))
}

pub(crate) fn values(args: &ArgMatches, name: &str) -> Vec<String> {
    args.values_of(name).map(|v| v.map(String::from).collect()).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::fs::write;
    use std::path::{Path, PathBuf};

    use clap::ArgMatches;
    use forest_viz::catalog::Catalog;
    use tempdir::TempDir;

    use crate::commands::{ClapCommand, Settings};

    pub fn with_data_dir(f: fn(PathBuf) -> ()) -> std::io::Result<()> {
        let dir = TempDir::new("forest-viz-cli")?;
        f(dir.path().to_path_buf());
        dir.close()
    }

    pub fn settings(data_dir: &Path) -> Settings {
        Settings { data_dir: data_dir.to_path_buf(), catalog: Catalog::usda_edw(), show_progress: false }
    }

    pub fn matches(command: &ClapCommand, args: &[&str]) -> ArgMatches {
        let mut argv = vec![command.identifier.as_str()];
        argv.extend_from_slice(args);
        command.register().get_matches_from(argv)
    }

    pub fn run(command: &ClapCommand, data_dir: &Path, args: &[&str]) -> anyhow::Result<()> {
        command.run(&settings(data_dir), &matches(command, args))
    }

    /// Two trailhead points with a name and a count.
    pub fn write_trailheads(dir: &Path) -> PathBuf {
        let path = dir.join("trailheads.geojson");
        write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-105.2, 40.1]},
                 "properties": {"name": "North", "spaces": 12}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-105.6, 40.4]},
                 "properties": {"name": "South", "spaces": 30}}
            ]}"#,
        )
        .unwrap();
        path
    }
}
