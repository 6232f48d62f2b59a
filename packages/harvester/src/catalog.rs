//! Remote catalog access.
//!
//! The synchronizer talks to the data center through the [`Catalog`] trait:
//! a cheap existence probe per candidate file name and, when documents are
//! downloaded, a full fetch.

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::{HarvesterError, Result};
use crate::http::{content_length, create_client, download_bytes};

/// Outcome of an existence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The document exists; `size` is its declared length if known.
    Found { size: Option<u64> },
    /// The catalog has no document at this URL.
    NotFound,
}

/// A remote catalog of bulletins.
pub trait Catalog {
    /// Check whether a document exists.
    ///
    /// Any answer other than found or not-found is a
    /// [`HarvesterError::Transport`] error.
    fn probe(&self, url: &str) -> Result<Probe>;

    /// Download a document.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Catalog served over HTTP, probed with `HEAD` requests.
pub struct HttpCatalog {
    client: Client,
}

impl HttpCatalog {
    /// Create a catalog with the default client.
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(create_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Catalog for HttpCatalog {
    fn probe(&self, url: &str) -> Result<Probe> {
        let response = self.client.head(url).send()?;
        let status = response.status();
        tracing::debug!(%url, status = status.as_u16(), "Probed");

        match status {
            StatusCode::OK => Ok(Probe::Found {
                size: content_length(&response),
            }),
            StatusCode::NOT_FOUND => Ok(Probe::NotFound),
            _ => Err(HarvesterError::Transport {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        download_bytes(&self.client, url)
    }
}
