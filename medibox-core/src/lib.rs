//! # Medibox Core Library
//!
//! Medicine lookup and daily medication reminders, without any I/O runtime.
//!
//! - [`Catalog`] — the loaded medicine dataset with detail lookups and a
//!   memoized search / suggestion filter.
//! - [`search`] — the pure substring filters behind the catalog.
//! - [`ReminderStore`] — the reminder list, mirrored into a
//!   [`KeyValueStore`](storage::KeyValueStore) as one JSON array.
//! - [`schedule`] — the trigger rules a poll tick applies, with an
//!   injectable [`Clock`](schedule::Clock).
//! - [`notification`] — the single visible notice and its expiry.
//!
//! Timers, debouncing and the dataset fetch live in `medibox-runtime` and
//! `medibox-data`; everything here is synchronous and deterministic.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notification;
pub mod reminders;
pub mod schedule;
pub mod search;
pub mod storage;
pub mod types;

pub use catalog::Catalog;
pub use config::MediboxConfig;
pub use error::MediboxError;
pub use reminders::ReminderStore;
pub use types::*;
