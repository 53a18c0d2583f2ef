use std::time::Instant;

use clap::{arg, ArgMatches};
use forest_viz::transform::{summary_statistics, ColumnSummary};

use crate::commands::input::{input_args, load_from_args};
use crate::commands::{required, values, ForestVizCommand, Settings};

#[cfg(test)]
mod tests {
    use forest_viz::transform::ColumnSummary;

    use crate::commands::stats::format_row;
    use crate::commands::test_support::{run, with_data_dir, write_trailheads};
    use crate::commands::{ClapCommand, Stats};

    #[test]
    fn summarises_numeric_columns() {
        with_data_dir(|dir| {
            let input = write_trailheads(&dir);
            let input = input.to_str().unwrap();
            let stats = ClapCommand::new("stats", Box::new(Stats {}));

            assert!(run(&stats, &dir, &[input]).is_ok());
            assert!(run(&stats, &dir, &[input, "--columns", "spaces", "--json"]).is_ok());
            assert!(run(&stats, &dir, &[input, "--columns", "owner"]).is_err());
        })
        .unwrap();
    }

    #[test]
    fn rows_line_up() {
        let summary = ColumnSummary {
            column: "spaces".into(),
            count: 2,
            mean: 21.0,
            std: f64::NAN,
            min: 12.0,
            q25: 16.5,
            median: 21.0,
            q75: 25.5,
            max: 30.0,
        };

        let row = format_row(&summary);
        assert!(row.starts_with("spaces"));
        assert!(row.contains("NaN"));
        assert!(row.ends_with("30.000"));
    }
}

const HEADER: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn format_row(summary: &ColumnSummary) -> String {
    let numbers = [
        summary.mean,
        summary.std,
        summary.min,
        summary.q25,
        summary.median,
        summary.q75,
        summary.max,
    ];
    let cells: Vec<String> = numbers.iter().map(|n| format!("{:>12.3}", n)).collect();
    format!("{:<24}{:>8}{}", summary.column, summary.count, cells.join(""))
}

pub struct Stats {}

impl ForestVizCommand for Stats {
    fn get_description(&self) -> &'static str {
        "Print summary statistics for numeric columns."
    }

    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        input_args(command)
            .arg(arg!(--columns [COLUMN] ... "Columns to describe, all numeric ones by default").multiple_values(true))
            .arg(arg!(--json "Print JSON instead of a table"))
    }

    fn exec(&self, _settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        let start = Instant::now();

        println!("▶️  Loading {}", required(args, "INPUT")?);
        let table = load_from_args(args)?;
        println!("✔️  Loaded {} features in {}ms", table.len(), start.elapsed().as_millis());

        let columns = values(args, "columns");
        let selected: Vec<&str> = columns.iter().map(String::as_str).collect();
        let summaries = summary_statistics(&table, (!selected.is_empty()).then(|| selected.as_slice()))?;

        if args.is_present("json") {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
            return Ok(());
        }

        let header: Vec<String> = HEADER[1..].iter().map(|h| format!("{:>12}", h)).collect();
        println!("\n{:<24}{:>8}{}", "column", HEADER[0], header.join(""));
        for summary in &summaries {
            println!("{}", format_row(summary));
        }

        Ok(())
    }
}
