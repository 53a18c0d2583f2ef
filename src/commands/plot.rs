use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{arg, ArgMatches};
use forest_viz::feature::SpatialTable;
use forest_viz::render::{plot_choropleth, plot_points, plot_polygons, ChoroplethOptions, Colormap, PlotOptions};
use geo::Geometry;

use crate::commands::input::{input_args, load_from_args};
use crate::commands::{required, ForestVizCommand, Settings};

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::commands::plot::parse_figsize;
    use crate::commands::test_support::{run, with_data_dir, write_trailheads};
    use crate::commands::{ClapCommand, Plot};

    #[test]
    fn renders_a_png() {
        with_data_dir(|dir| {
            let input = write_trailheads(&dir);
            let output = dir.join("maps").join("trailheads.png");
            let plot = ClapCommand::new("plot", Box::new(Plot {}));

            let args = [
                input.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
                "--column",
                "spaces",
                "--figsize",
                "2x1.5",
            ];
            run(&plot, &dir, &args).unwrap();

            let img = image::open(&output).unwrap();
            assert_eq!((600, 450), (img.width(), img.height()));
        })
        .unwrap();
    }

    #[test]
    fn rejects_bad_options() {
        with_data_dir(|dir| {
            let input = write_trailheads(&dir);
            let input = input.to_str().unwrap();
            let output = dir.join("out.png");
            let output = output.to_str().unwrap();
            let plot = ClapCommand::new("plot", Box::new(Plot {}));

            assert!(run(&plot, &dir, &[input, "-o", output, "--colormap", "jet"]).is_err());
            assert!(run(&plot, &dir, &[input, "-o", output, "--kind", "choropleth"]).is_err());
            assert!(run(&plot, &dir, &[input, "-o", output, "--column", "owner"]).is_err());
            assert!(!dir.join("out.png").exists());
        })
        .unwrap();
    }

    #[rstest]
    #[case("15x10", Some((15.0, 10.0)))]
    #[case("2.5X4", Some((2.5, 4.0)))]
    #[case("15", None)]
    #[case("0x4", None)]
    fn figsize_parsing(#[case] text: &str, #[case] expected: Option<(f64, f64)>) {
        assert_eq!(expected, parse_figsize(text).ok());
    }
}

fn parse_figsize(text: &str) -> anyhow::Result<(f64, f64)> {
    let lower = text.to_lowercase();
    let (width, height) = lower.split_once('x').context("Figure size must look like WIDTHxHEIGHT")?;
    let size = (width.trim().parse::<f64>()?, height.trim().parse::<f64>()?);

    if !(size.0 > 0.0 && size.1 > 0.0) {
        bail!("Figure size must be positive, got {}", text);
    }
    Ok(size)
}

fn only_points(table: &SpatialTable) -> bool {
    !table.is_empty()
        && table
            .iter()
            .all(|f| matches!(f.geometry, Geometry::Point(_) | Geometry::MultiPoint(_)))
}

pub struct Plot {}

impl ForestVizCommand for Plot {
    fn get_description(&self) -> &'static str {
        "Render a dataset to a PNG map."
    }

    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        input_args(command)
            .arg(arg!(-o --output <PNG> "Where to write the map"))
            .arg(arg!(--column [COLUMN] "Column driving the fill colour"))
            .arg(arg!(--title [TITLE] "Map title"))
            .arg(arg!(--colormap [NAME] "Colour ramp").default_value("viridis"))
            .arg(
                arg!(--kind [KIND] "What to draw")
                    .possible_values(["auto", "polygons", "points", "choropleth"])
                    .default_value("auto"),
            )
            .arg(arg!(--figsize [SIZE] "Figure size in inches").default_value("15x10"))
    }

    fn exec(&self, _settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        let start = Instant::now();
        let output = PathBuf::from(required(args, "output")?);
        let column = args.value_of("column");
        let colormap: Colormap = args.value_of("colormap").unwrap_or("viridis").parse()?;
        let figsize = parse_figsize(args.value_of("figsize").unwrap_or("15x10"))?;

        let now = Instant::now();
        println!("▶️  Loading {}", required(args, "INPUT")?);
        let table = load_from_args(args)?;
        println!("✔️  Loaded {} features in {}ms", table.len(), now.elapsed().as_millis());

        let now = Instant::now();
        println!("▶️  Rendering map");
        match args.value_of("kind").unwrap_or("auto") {
            "choropleth" => {
                let column = column.context("A choropleth needs --column")?;
                let mut options = ChoroplethOptions { colormap, figsize, output_path: Some(output.clone()), ..ChoroplethOptions::default() };
                if let Some(title) = args.value_of("title") {
                    options.title = title.to_string();
                }
                plot_choropleth(&table, column, &options)?;
            }
            kind => {
                let mut options = PlotOptions {
                    column: column.map(String::from),
                    colormap,
                    figsize,
                    output_path: Some(output.clone()),
                    ..PlotOptions::default()
                };
                if let Some(title) = args.value_of("title") {
                    options.title = title.to_string();
                }

                if kind == "points" || (kind == "auto" && only_points(&table)) {
                    plot_points(&table, &options)?;
                } else {
                    plot_polygons(&table, &options)?;
                }
            }
        }
        println!("✔️  Rendered {} in {}ms", output.display(), now.elapsed().as_millis());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());
        Ok(())
    }
}
