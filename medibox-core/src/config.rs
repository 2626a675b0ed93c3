//! Configuration for Medibox.
//!
//! Maps directly to `medibox.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MediboxError, Result};

/// Top-level Medibox configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediboxConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Where the medicine dataset comes from.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Search and suggestion limits.
    #[serde(default)]
    pub search: SearchConfig,
    /// Reminder polling and notification settings.
    #[serde(default)]
    pub reminders: ReminderConfig,
    /// Key/value storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl MediboxConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MediboxError::Config` if the TOML is invalid or fails
    /// [`validate`](Self::validate).
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| MediboxError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values that would stall timers or empty every result list.
    ///
    /// # Errors
    /// Returns `MediboxError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("search.max_results", self.search.max_results == 0),
            ("search.max_suggestions", self.search.max_suggestions == 0),
            ("search.cache_capacity", self.search.cache_capacity == 0),
            ("reminders.poll_interval_secs", self.reminders.poll_interval_secs == 0),
            ("reminders.match_window_secs", self.reminders.match_window_secs == 0),
            (
                "reminders.notification_ttl_secs",
                self.reminders.notification_ttl_secs == 0,
            ),
            ("reminders.storage_key", self.reminders.storage_key.trim().is_empty()),
        ];
        match checks.iter().find(|(_, bad)| *bad) {
            Some((field, _)) => Err(MediboxError::Config(format!("{field} must be non-zero"))),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Dataset location. `url` wins when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// HTTP(S) URL serving the JSON array of medicines.
    #[serde(default)]
    pub url: Option<String>,
    /// Local JSON file with the same content.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Hard timeout for the dataset request in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Search and suggestion limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Trimmed queries shorter than this produce no results.
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
    /// Cap on search results, bounds rendering cost.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Cap on name suggestions while creating a reminder.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Quiet period before a typed query is filtered.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Number of recent queries whose matches are memoized.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl SearchConfig {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_query_chars: default_min_query_chars(),
            max_results: default_max_results(),
            max_suggestions: default_max_suggestions(),
            debounce_ms: default_debounce_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Reminder polling and notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Storage key holding the JSON array of reminders.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Seconds between poll ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// A reminder matches while `|now - target| < match_window_secs`.
    #[serde(default = "default_match_window_secs")]
    pub match_window_secs: u64,
    /// Seconds before a visible notification auto-dismisses.
    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: u64,
}

impl ReminderConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Notification TTL as a [`Duration`].
    #[must_use]
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            poll_interval_secs: default_poll_interval_secs(),
            match_window_secs: default_match_window_secs(),
            notification_ttl_secs: default_notification_ttl_secs(),
        }
    }
}

/// Key/value storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file. In-memory (lost on exit) when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Use SQLite WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Store and verify a CRC-32 per value.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (for serde)
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_min_query_chars() -> usize {
    2
}
fn default_max_results() -> usize {
    50
}
fn default_max_suggestions() -> usize {
    10
}
fn default_debounce_ms() -> u64 {
    300
}
fn default_cache_capacity() -> usize {
    64
}
fn default_storage_key() -> String {
    "medicineReminders".to_string()
}
fn default_poll_interval_secs() -> u64 {
    10
}
fn default_match_window_secs() -> u64 {
    60
}
fn default_notification_ttl_secs() -> u64 {
    5
}
