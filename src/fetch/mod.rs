mod extract;
mod source;

use std::fs::create_dir_all;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::catalog::{Catalog, DatasetFormat};
use crate::error::{Error, Result};

pub use extract::{extract_archive, staging_dir};
pub use source::{ArchiveResponse, ArchiveSource, HttpSource};

const CHUNK_SIZE: usize = 8192;


/// Downloads catalog archives and unpacks them below a data directory.
pub struct Fetcher<'a> {
    catalog: &'a Catalog,
    data_dir: PathBuf,
    source: Box<dyn ArchiveSource>,
    show_progress: bool,
}

impl<'a> Fetcher<'a> {
    pub fn new(catalog: &'a Catalog, data_dir: &Path, source: Box<dyn ArchiveSource>) -> Result<Self> {
        for format in [DatasetFormat::Shapefile, DatasetFormat::Geodatabase] {
            create_dir_all(data_dir.join(format.category_dir()))?;
        }

        Ok(Fetcher {
            catalog,
            data_dir: data_dir.to_path_buf(),
            source,
            show_progress: false,
        })
    }

    /// Draw an indicatif progress bar while downloading.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory a dataset is extracted to. `name` must be a single normal
    /// path component so extraction stays inside the category directory.
    pub fn target_dir(&self, name: &str, format: DatasetFormat) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part.to_str() == Some(name) => {
                Ok(self.data_dir.join(format.category_dir()).join(name))
            }
            _ => Err(Error::InvalidName(name.to_string())),
        }
    }

    /// Downloads and extracts a catalog dataset, returning its directory.
    ///
    /// An existing directory is returned as is unless `force` is set.
    pub fn fetch(&self, name: &str, format: DatasetFormat, force: bool) -> Result<PathBuf> {
        let url = self.catalog.resolve_url(name, format)?;
        let output_dir = self.target_dir(name, format)?;

        if output_dir.exists() && !force {
            info!("Dataset '{}' already exists at {}", name, output_dir.display());
            return Ok(output_dir);
        }

        info!("Downloading {} ({}) from {}", name, format, url);
        let bytes = self.download(&url)?;

        info!("Extracting {} bytes to {}", bytes.len(), output_dir.display());
        extract_archive(bytes, &output_dir)
    }

    /// Downloads an arbitrary zip archive into `<category>/<output_name>`.
    pub fn fetch_custom(&self, url: &str, output_name: &str, format: DatasetFormat) -> Result<PathBuf> {
        let output_dir = self.target_dir(output_name, format)?;

        info!("Downloading custom dataset from {}", url);
        let bytes = self.download(url)?;

        extract_archive(bytes, &output_dir)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = self.source.open(url)?;
        let total = response.content_length.filter(|len| *len > 0);
        let progress = self.progress_bar(total);

        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = [0u8; CHUNK_SIZE];
        let mut last_percent = 0;

        loop {
            let read = response.body.read(&mut chunk).map_err(|e| Error::transport(url, e))?;
            if read == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..read]);
            progress.set_position(bytes.len() as u64);

            if let Some(total) = total {
                let percent = bytes.len() as u64 * 100 / total;
                if percent != last_percent {
                    last_percent = percent;
                    debug!("Progress: {}%", percent);
                }
            }
        }

        progress.finish_and_clear();
        Ok(bytes)
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                if let Ok(style) = ProgressStyle::with_template("{bar:40} {bytes}/{total_bytes} ({percent}%)") {
                    bar.set_style(style);
                }
                bar
            }
            None => ProgressBar::new_spinner(),
        }
    }
}
