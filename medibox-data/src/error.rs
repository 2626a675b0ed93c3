//! Dataset loading error types.

use thiserror::Error;

/// Errors that can occur while loading the medicine dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP request failed for a reason other than timeout or connection.
    #[error("Dataset request failed: {0}")]
    RequestFailed(String),

    /// Server answered with a non-success status.
    #[error("Dataset request returned HTTP {status}")]
    Status { status: u16 },

    /// Body was not a valid medicine array.
    #[error("Failed to parse dataset: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("Dataset request timed out after {0}ms")]
    Timeout(u64),

    /// Server could not be reached.
    #[error("Dataset server unavailable: {0}")]
    Unavailable(String),

    /// Local dataset file could not be read.
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    /// No source configured.
    #[error("No dataset source configured")]
    NotConfigured,
}

/// User-facing text for any failed dataset load.
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load medicine data. Please try again later.";

impl DataError {
    /// Static message shown in place of the search view when loading fails.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            DataError::NotConfigured => "No medicine data source is configured.",
            _ => LOAD_FAILED_MESSAGE,
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout(0)
        } else if err.is_connect() {
            DataError::Unavailable(err.to_string())
        } else if err.is_decode() {
            DataError::Parse(err.to_string())
        } else {
            DataError::RequestFailed(err.to_string())
        }
    }
}
