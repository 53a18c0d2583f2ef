use std::path::PathBuf;
use std::time::Instant;

use clap::{arg, Arg, ArgMatches};
use forest_viz::render::{InteractiveMap, MapOptions};

use crate::commands::input::{input_args, load_from_args};
use crate::commands::{required, values, ForestVizCommand, Settings};


pub struct Map {}

impl ForestVizCommand for Map {
    fn get_description(&self) -> &'static str {
        "Render a dataset to an interactive HTML map."
    }

    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        input_args(command)
            .arg(arg!(-o --output <HTML> "Where to write the page"))
            .arg(
                Arg::new("style-column")
                    .long("style-column")
                    .value_name("COLUMN")
                    .help("Column whose values pick feature colours"),
            )
            .arg(arg!(--popup [FIELD] ... "Fields listed in the popup").multiple_values(true))
            .arg(arg!(--tooltip [FIELD] ... "Fields shown on hover").multiple_values(true))
            .arg(arg!(--tiles [TILES] "Base map").default_value("OpenStreetMap"))
    }

    fn exec(&self, _settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        let start = Instant::now();
        let output = PathBuf::from(required(args, "output")?);

        let now = Instant::now();
        println!("▶️  Loading {}", required(args, "INPUT")?);
        let table = load_from_args(args)?;
        println!("✔️  Loaded {} features in {}ms", table.len(), now.elapsed().as_millis());

        let options = MapOptions {
            style_column: args.value_of("style-column").map(String::from),
            popup_fields: values(args, "popup"),
            tooltip_fields: values(args, "tooltip"),
            tiles: args.value_of("tiles").unwrap_or("OpenStreetMap").to_string(),
            ..MapOptions::default()
        };

        let now = Instant::now();
        println!("▶️  Building web map");
        let map = InteractiveMap::create_map(&table, &options)?;
        map.save(&output)?;
        println!("✔️  Wrote {} in {}ms", output.display(), now.elapsed().as_millis());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());
        Ok(())
    }
}
