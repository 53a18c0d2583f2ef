use std::io::Read;

use reqwest::blocking::Client;

use crate::error::{Error, Result};

/// An opened archive download: the announced size and the body stream.
pub struct ArchiveResponse {
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

/// Where archive bytes come from. The fetcher only ever talks to this.
pub trait ArchiveSource {
    /// Opens `url`, failing with [`Error::Download`] for non-2xx answers.
    fn open(&self, url: &str) -> Result<ArchiveResponse>;
}

/// Blocking HTTP(S) source backed by reqwest.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("forest-viz/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::transport("<client>", e))?;

        Ok(HttpSource { client })
    }
}

impl ArchiveSource for HttpSource {
    fn open(&self, url: &str) -> Result<ArchiveResponse> {
        let response = self.client.get(url).send().map_err(|e| Error::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(url, status.as_u16()));
        }

        Ok(ArchiveResponse {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}
