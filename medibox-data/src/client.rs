//! Catalog client — loads the medicine dataset from its configured source.

use std::time::{Duration, Instant};

use medibox_core::Medicine;
use medibox_core::config::CatalogConfig;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::DataError;
use crate::types::{CatalogSource, FetchOptions, parse_medicines};

/// Loads the dataset once per call. No caching, no retries.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    source: CatalogSource,
    http: Client,
    options: FetchOptions,
}

impl CatalogClient {
    /// Create a client for `source`.
    #[must_use]
    pub fn new(source: CatalogSource, options: FetchOptions) -> Self {
        Self {
            source,
            http: Client::new(),
            options,
        }
    }

    /// Create a client from the `[catalog]` configuration section.
    ///
    /// # Errors
    /// Returns [`DataError::NotConfigured`] if neither `url` nor `path` is set.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, DataError> {
        Ok(Self::new(
            CatalogSource::from_config(config)?,
            FetchOptions::from_config(config),
        ))
    }

    /// The configured source.
    #[must_use]
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Load the dataset.
    ///
    /// # Errors
    /// Any transport, status, I/O or parse failure; see [`DataError`].
    pub async fn fetch(&self) -> Result<Vec<Medicine>, DataError> {
        let start = Instant::now();
        let result = match &self.source {
            CatalogSource::Http { url } => self.fetch_http(url).await,
            CatalogSource::File { path } => {
                let body = tokio::fs::read(path).await?;
                parse_medicines(&body)
            }
        };

        match &result {
            Ok(medicines) => info!(
                source = %self.source.describe(),
                medicines = medicines.len(),
                elapsed_ms = start.elapsed().as_millis(),
                "Medicine dataset loaded"
            ),
            Err(e) => warn!(
                source = %self.source.describe(),
                error = %e,
                "Failed to load medicine dataset"
            ),
        }
        result
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<Medicine>, DataError> {
        let timeout = self.options.timeout;
        debug!(url, timeout_ms = timeout.as_millis(), "Requesting medicine dataset");

        let resp = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| classify(e, timeout))?;
        debug!(url, bytes = body.len(), "Dataset body received");
        parse_medicines(&body)
    }
}

/// Like `From<reqwest::Error>`, but with the real timeout in the message.
fn classify(err: reqwest::Error, timeout: Duration) -> DataError {
    if err.is_timeout() {
        DataError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    } else {
        DataError::from(err)
    }
}
