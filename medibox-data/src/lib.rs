//! # medibox-data — Dataset Adapter for Medibox
//!
//! Loads the static medicine dataset once per session from one of:
//!   - **HTTP** — a GET on a fixed URL returning a JSON array
//!   - **File** — the same JSON read from local disk
//!
//! There is no retry policy: a failed load is reported once and the caller
//! decides what to show. [`DataError::user_message`] gives the text meant for
//! the user; the error itself carries the detail for the logs.

pub mod client;
pub mod error;
pub mod types;

pub use client::CatalogClient;
pub use error::DataError;
pub use types::{CatalogSource, parse_medicines};
