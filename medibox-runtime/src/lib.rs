//! # medibox-runtime — async services and the daemon
//!
//! Wires the synchronous `medibox-core` model to Tokio:
//!
//! - `debounce` — trailing-edge debouncer for search input
//! - `session` — search-as-you-type over the shared catalog
//! - `notify` — the single visible notice with its auto-dismiss timer
//! - `scheduler` — the reminder polling loop
//! - `context` — [`AppContext`], the owner of every shared service
//! - `console` — line commands for the `medibox` binary
//! - `telemetry` — tracing subscriber setup

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod console;
pub mod context;
pub mod debounce;
pub mod notify;
pub mod scheduler;
pub mod session;
pub mod telemetry;

pub use context::AppContext;
pub use notify::NotificationCenter;
pub use scheduler::{ReminderScheduler, SchedulerHandle};
pub use session::{SearchSession, SearchSnapshot};
