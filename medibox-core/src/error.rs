//! Error types for the Medibox core library.

use thiserror::Error;

use crate::types::ReminderId;

/// Top-level error type for all core Medibox operations.
#[derive(Error, Debug)]
pub enum MediboxError {
    /// User-supplied reminder fields failed validation.
    #[error("Invalid reminder: {reason}")]
    InvalidReminder {
        /// Why the reminder was rejected.
        reason: String,
    },

    /// A reminder with the given ID was not found.
    #[error("Reminder not found: {0}")]
    ReminderNotFound(ReminderId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediboxError {
    /// Shorthand for an [`MediboxError::InvalidReminder`].
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidReminder {
            reason: reason.into(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, MediboxError>;
