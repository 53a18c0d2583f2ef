use crate::catalog::DatasetFormat;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Dataset '{name}' not found. Available datasets: {}", .available.join(", "))]
    UnknownDataset { name: String, available: Vec<String> },

    #[error("Format must be 'shapefile' or 'geodatabase', got '{0}'")]
    InvalidFormat(String),

    #[error("Format '{format}' not available for dataset '{name}'")]
    FormatUnavailable { name: String, format: DatasetFormat },

    #[error("Download of {url} failed: {reason}")]
    Download {
        url: String,
        /// HTTP status, absent for transport failures
        status: Option<u16>,
        reason: String,
    },

    #[error("Dataset name '{0}' must be a plain directory name")]
    InvalidName(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Layer '{layer}' not found. Available layers: {}", .available.join(", "))]
    LayerNotFound { layer: String, available: Vec<String> },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Unit must be one of: {expected}, got '{unit}'")]
    InvalidUnit { unit: String, expected: &'static str },

    #[error("Colormap '{0}' is not known")]
    InvalidColormap(String),

    #[error("{0}")]
    EmptyInput(&'static str),

    #[error("Projection failed: {0}")]
    Projection(String),

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid shapefile: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[cfg(feature = "gdal")]
    #[error(transparent)]
    Gdal(#[from] gdal::errors::GdalError),
}

impl Error {
    pub fn http_status(url: &str, status: u16) -> Self {
        Error::Download {
            url: url.to_string(),
            status: Some(status),
            reason: format!("HTTP status {}", status),
        }
    }

    pub fn transport(url: &str, reason: impl ToString) -> Self {
        Error::Download {
            url: url.to_string(),
            status: None,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
