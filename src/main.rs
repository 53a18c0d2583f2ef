use forest_viz::catalog::SerdeCatalogParser;
use tracing_subscriber::EnvFilter;

use crate::commands::{http_source, Check, ClapCommand, Download, DownloadUrl, Info, List, Map, Plot, Settings, Stats};

mod commands;

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use crate::execute;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn runs_catalog_commands() {
        let dir = TempDir::new("forest-viz-main").unwrap();
        let data_dir = dir.path().to_str().unwrap();

        assert!(execute(&args(&["forest-viz", "--data-dir", data_dir, "list"])).is_ok());
        assert!(execute(&args(&["forest-viz", "info", "Actv_TimberHarvest", "--quiet"])).is_ok());
        assert!(execute(&args(&["forest-viz", "--data-dir", data_dir, "check"])).is_ok());
    }

    #[test]
    fn errors_propagate() {
        assert!(execute(&args(&["forest-viz", "info", "Nope"])).is_err());
        assert!(execute(&args(&["forest-viz", "--catalog", "/does/not/exist.json", "list"])).is_err());
    }
}

fn main() {
    let args: Vec<_> = std::env::args().collect();

    if let Err(e) = execute(&args) {
        println!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "forest_viz=warn" } else { "forest_viz=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // a subscriber may already be installed when running more than once
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

fn execute(input: &[String]) -> anyhow::Result<()> {
    let commands: Vec<ClapCommand> = vec![
        ClapCommand::new("list", Box::new(List {})),
        ClapCommand::new("info", Box::new(Info {})),
        ClapCommand::new("download", Box::new(Download::new(http_source))),
        ClapCommand::new("download-url", Box::new(DownloadUrl::new(http_source))),
        ClapCommand::new("plot", Box::new(Plot {})),
        ClapCommand::new("map", Box::new(Map {})),
        ClapCommand::new("stats", Box::new(Stats {})),
        ClapCommand::new("check", Box::new(Check {})),
        // Add commands here
    ];

    let mut app = clap::command!()
        .propagate_version(true)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .args(Settings::global_args());

    app = commands.iter().fold(app, |a, c| a.subcommand(c.register()));

    let matches = app.get_matches_from(input);
    init_tracing(matches.is_present("quiet"));

    let settings = Settings::from_matches(&matches, &SerdeCatalogParser {})?;

    match matches.subcommand() {
        Some((name, sub_matches)) => match commands.iter().find(|c| c.identifier == name) {
            Some(command) => command.run(&settings, sub_matches),
            None => unreachable!(),
        },
        None => unreachable!(),
    }
}
