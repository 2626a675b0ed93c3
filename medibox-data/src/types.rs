//! Dataset source description and body parsing.

use std::path::PathBuf;
use std::time::Duration;

use medibox_core::Medicine;
use medibox_core::config::CatalogConfig;
use serde::Deserialize;

use crate::error::DataError;

/// Where the medicine dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// GET this URL.
    Http { url: String },
    /// Read this JSON file.
    File { path: PathBuf },
}

impl CatalogSource {
    /// Pick the source from configuration; the URL wins over the path.
    ///
    /// Returns `Err(DataError::NotConfigured)` when neither is set.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, DataError> {
        match (&config.url, &config.path) {
            (Some(url), _) => Ok(Self::Http { url: url.clone() }),
            (None, Some(path)) => Ok(Self::File { path: path.clone() }),
            (None, None) => Err(DataError::NotConfigured),
        }
    }

    /// Human-readable location, for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Http { url } => url.clone(),
            Self::File { path } => path.display().to_string(),
        }
    }
}

/// Settings for one load.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Hard timeout for the HTTP request.
    pub timeout: Duration,
}

impl FetchOptions {
    /// Options from the catalog configuration.
    #[must_use]
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

#[derive(Deserialize)]
struct WrappedDataset {
    medicines: Vec<Medicine>,
}

/// Parse a dataset body: a bare JSON array of medicines, or an object with a
/// `medicines` array.
///
/// # Errors
/// Returns [`DataError::Parse`] if the body matches neither shape.
pub fn parse_medicines(body: &[u8]) -> Result<Vec<Medicine>, DataError> {
    let parsed = if body.trim_ascii_start().first() == Some(&b'{') {
        serde_json::from_slice::<WrappedDataset>(body).map(|w| w.medicines)
    } else {
        serde_json::from_slice::<Vec<Medicine>>(body)
    };
    parsed.map_err(|e| DataError::Parse(e.to_string()))
}
