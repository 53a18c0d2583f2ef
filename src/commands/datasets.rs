use std::time::Instant;

use clap::{arg, ArgMatches};
use forest_viz::catalog::DatasetFormat;
use forest_viz::fetch::Fetcher;

use crate::commands::{required, ForestVizCommand, Settings, SourceFactory};

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::{Cursor, Write};

    use forest_viz::fetch::{ArchiveResponse, ArchiveSource};
    use forest_viz::Error;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    use crate::commands::test_support::{run, with_data_dir};
    use crate::commands::{ClapCommand, Download, DownloadUrl, Info, List};

    thread_local! {
        static REQUESTS: Cell<usize> = Cell::new(0);
    }

    struct ZipSource {}

    impl ArchiveSource for ZipSource {
        fn open(&self, _url: &str) -> forest_viz::Result<ArchiveResponse> {
            REQUESTS.with(|r| r.set(r.get() + 1));

            let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
            writer.start_file("Actv_TimberHarvest.shp", FileOptions::default())?;
            writer.write_all(b"shape")?;
            let bytes = writer.finish()?.into_inner();

            Ok(ArchiveResponse { content_length: Some(bytes.len() as u64), body: Box::new(Cursor::new(bytes)) })
        }
    }

    fn zip_source() -> forest_viz::Result<Box<dyn ArchiveSource>> {
        Ok(Box::new(ZipSource {}))
    }

    fn unreachable_source() -> forest_viz::Result<Box<dyn ArchiveSource>> {
        Err(Error::transport("https://example.org", "offline"))
    }

    #[test]
    fn list_and_info_read_the_catalog() {
        with_data_dir(|data_dir| {
            assert!(run(&ClapCommand::new("list", Box::new(List {})), &data_dir, &[]).is_ok());

            let info = ClapCommand::new("info", Box::new(Info {}));
            assert!(run(&info, &data_dir, &["Actv_TimberHarvest"]).is_ok());
            assert!(run(&info, &data_dir, &["Nope"]).is_err());
        })
        .unwrap();
    }

    #[test]
    fn download_extracts_once_unless_forced() {
        with_data_dir(|data_dir| {
            REQUESTS.with(|r| r.set(0));
            let download = ClapCommand::new("download", Box::new(Download::new(zip_source)));

            run(&download, &data_dir, &["Actv_TimberHarvest"]).unwrap();
            run(&download, &data_dir, &["Actv_TimberHarvest"]).unwrap();
            assert_eq!(1, REQUESTS.with(|r| r.get()));

            run(&download, &data_dir, &["Actv_TimberHarvest", "--force"]).unwrap();
            assert_eq!(2, REQUESTS.with(|r| r.get()));

            assert!(data_dir.join("shapefiles/Actv_TimberHarvest/Actv_TimberHarvest.shp").is_file());
        })
        .unwrap();
    }

    #[test]
    fn download_rejects_bad_formats() {
        with_data_dir(|data_dir| {
            let download = ClapCommand::new("download", Box::new(Download::new(zip_source)));
            assert!(run(&download, &data_dir, &["Actv_TimberHarvest", "--format", "kml"]).is_err());
        })
        .unwrap();
    }

    #[test]
    fn download_url_lands_in_the_category_dir() {
        with_data_dir(|data_dir| {
            let download = ClapCommand::new("download-url", Box::new(DownloadUrl::new(zip_source)));

            run(&download, &data_dir, &["https://example.org/custom.zip", "Custom", "--format", "geodatabase"]).unwrap();

            assert!(data_dir.join("geodatabases/Custom/Actv_TimberHarvest.shp").is_file());
        })
        .unwrap();
    }

    #[test]
    fn source_failures_surface() {
        with_data_dir(|data_dir| {
            let download = ClapCommand::new("download", Box::new(Download::new(unreachable_source)));
            assert!(run(&download, &data_dir, &["Actv_TimberHarvest"]).is_err());
        })
        .unwrap();
    }
}

fn format_arg(args: &ArgMatches) -> anyhow::Result<DatasetFormat> {
    Ok(args.value_of("format").unwrap_or("shapefile").parse()?)
}

pub struct List {}

impl ForestVizCommand for List {
    fn get_description(&self) -> &'static str {
        "List the datasets in the catalog."
    }

    fn exec(&self, settings: &Settings, _args: &ArgMatches) -> anyhow::Result<()> {
        let names = settings.catalog.list();
        println!("📚  Available datasets ({}):", names.len());

        for name in names {
            let info = settings.catalog.info(name)?;
            let formats: Vec<String> = info.available_formats.iter().map(|f| f.to_string()).collect();
            println!("    {} ({})", name, formats.join(", "));
        }

        Ok(())
    }
}

pub struct Info {}

impl ForestVizCommand for Info {
    fn get_description(&self) -> &'static str {
        "Show formats and metadata for a dataset."
    }

    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        command.arg(arg!(<NAME> "Dataset name"))
    }

    fn exec(&self, settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        let info = settings.catalog.info(required(args, "NAME")?)?;

        println!("ℹ️  {}", info.name);
        println!("    Metadata: {}", info.metadata_url);
        for format in &info.available_formats {
            println!("    {}: {}", format, settings.catalog.resolve_url(&info.name, *format)?);
        }

        Ok(())
    }
}

pub struct Download {
    source: SourceFactory,
}

impl Download {
    pub fn new(source: SourceFactory) -> Self {
        Download { source }
    }
}

impl ForestVizCommand for Download {
    fn get_description(&self) -> &'static str {
        "Download and extract a catalog dataset."
    }

    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        command
            .arg(arg!(<NAME> "Dataset name"))
            .arg(arg!(-f --format [FORMAT] "shapefile or geodatabase").default_value("shapefile"))
            .arg(arg!(--force "Download again even if the dataset exists"))
    }

    fn exec(&self, settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        let start = Instant::now();
        let name = required(args, "NAME")?;
        let format = format_arg(args)?;

        let fetcher = Fetcher::new(&settings.catalog, &settings.data_dir, (self.source)()?)?
            .with_progress(settings.show_progress);

        println!("▶️  Fetching {} ({})", name, format);
        let path = fetcher.fetch(name, format, args.is_present("force"))?;
        println!("✔️  {} is in {}", name, path.display());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());
        Ok(())
    }
}

pub struct DownloadUrl {
    source: SourceFactory,
}

impl DownloadUrl {
    pub fn new(source: SourceFactory) -> Self {
        DownloadUrl { source }
    }
}

impl ForestVizCommand for DownloadUrl {
    fn get_description(&self) -> &'static str {
        "Download and extract a zip archive from any URL."
    }

    fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
        command
            .arg(arg!(<URL> "Archive URL"))
            .arg(arg!(<OUTPUT_NAME> "Directory name below the data directory"))
            .arg(arg!(-f --format [FORMAT] "shapefile or geodatabase").default_value("shapefile"))
    }

    fn exec(&self, settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        let start = Instant::now();
        let url = required(args, "URL")?;
        let output_name = required(args, "OUTPUT_NAME")?;
        let format = format_arg(args)?;

        let fetcher = Fetcher::new(&settings.catalog, &settings.data_dir, (self.source)()?)?
            .with_progress(settings.show_progress);

        println!("▶️  Fetching {}", url);
        let path = fetcher.fetch_custom(url, output_name, format)?;
        println!("✔️  Extracted to {}", path.display());

        println!("\n    🎉  Finished in {}ms", start.elapsed().as_millis());
        Ok(())
    }
}
