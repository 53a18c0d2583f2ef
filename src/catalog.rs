use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};


pub const USDA_EDW_BASE_URL: &str = "https://data.fs.usda.gov/geodata/edw/";

const USDA_EDW_DATASETS: [&str; 6] = [
    "Actv_TimberHarvest",
    "Actv_HazFuelTrt_PL",
    "Actv_HazFuelTrt_LN",
    "Actv_SilvReforest",
    "Actv_SilvTSI",
    "Actv_RngVegImprove",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFormat {
    Shapefile,
    Geodatabase,
}

impl DatasetFormat {
    /// Directory below the data dir holding extracted archives of this format.
    pub fn category_dir(&self) -> &'static str {
        match self {
            DatasetFormat::Shapefile => "shapefiles",
            DatasetFormat::Geodatabase => "geodatabases",
        }
    }
}

impl Display for DatasetFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetFormat::Shapefile => write!(f, "shapefile"),
            DatasetFormat::Geodatabase => write!(f, "geodatabase"),
        }
    }
}

impl FromStr for DatasetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "shapefile" => Ok(DatasetFormat::Shapefile),
            "geodatabase" => Ok(DatasetFormat::Geodatabase),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDescriptor {
    pub name: String,
    pub formats: BTreeMap<DatasetFormat, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub available_formats: Vec<DatasetFormat>,
    pub metadata_url: String,
}

/// The immutable set of downloadable datasets and where they live.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    base_url: String,
    datasets: Vec<DatasetDescriptor>,
}

impl Catalog {
    pub fn new(base_url: &str, datasets: Vec<(String, Vec<(DatasetFormat, String)>)>) -> Self {
        Catalog {
            base_url: base_url.to_string(),
            datasets: datasets
                .into_iter()
                .map(|(name, formats)| DatasetDescriptor { name, formats: formats.into_iter().collect() })
                .collect(),
        }
    }

    /// The USDA Forest Service Enterprise Data Warehouse activity layers.
    pub fn usda_edw() -> Self {
        let datasets = USDA_EDW_DATASETS
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    vec![
                        (DatasetFormat::Shapefile, format!("edw_resources/shp/{}.zip", name)),
                        (DatasetFormat::Geodatabase, format!("edw_resources/fc/{}.gdb.zip", name)),
                    ],
                )
            })
            .collect();

        Catalog::new(USDA_EDW_BASE_URL, datasets)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn list(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn descriptor(&self, name: &str) -> Result<&DatasetDescriptor> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| Error::UnknownDataset {
                name: name.to_string(),
                available: self.list().into_iter().map(String::from).collect(),
            })
    }

    pub fn info(&self, name: &str) -> Result<DatasetInfo> {
        let descriptor = self.descriptor(name)?;

        Ok(DatasetInfo {
            name: descriptor.name.clone(),
            available_formats: descriptor.formats.keys().copied().collect(),
            metadata_url: self.join(&format!("edw_resources/meta/{}.xml", name)),
        })
    }

    pub fn resolve_url(&self, name: &str, format: DatasetFormat) -> Result<String> {
        let relative = self
            .descriptor(name)?
            .formats
            .get(&format)
            .ok_or_else(|| Error::FormatUnavailable { name: name.to_string(), format })?;

        Ok(self.join(relative))
    }

    fn join(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), relative.trim_start_matches('/'))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::usda_edw()
    }
}

pub trait CatalogParser {
    fn parse(&self, path: &Path) -> Result<Catalog>;
}

pub struct SerdeCatalogParser {}

impl CatalogParser for SerdeCatalogParser {
    fn parse(&self, path: &Path) -> Result<Catalog> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("Couldn't find catalog file {}", path.display())));
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
pub struct DummyCatalogParser {
    pub succeeds: bool,
}

#[cfg(test)]
impl CatalogParser for DummyCatalogParser {
    fn parse(&self, _: &Path) -> Result<Catalog> {
        if self.succeeds {
            Ok(Catalog::new("https://localhost/", vec![("dummy".to_string(), vec![])]))
        } else {
            Err(Error::NotFound("dummy error".to_string()))
        }
    }
}
