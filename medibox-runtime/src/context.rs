//! Application context — the one owner of every shared service.
//!
//! Consumers receive an [`AppContext`] instead of reaching for globals: the
//! catalog, the reminder store, the notification center and the clock they
//! all agree on.

use std::sync::Arc;

use medibox_core::config::StorageConfig;
use medibox_core::schedule::{Clock, SystemClock, TriggerPolicy};
use medibox_core::storage::{self, KeyValueStore, MemoryStore};
use medibox_core::{Catalog, MediboxConfig, NewReminder, Reminder, ReminderId, ReminderStore};
use medibox_data::{CatalogClient, DataError};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::notify::NotificationCenter;
use crate::scheduler::{ReminderScheduler, SchedulerHandle, SharedReminders};
use crate::session::SearchSession;

/// Shared services for one running instance.
pub struct AppContext {
    config: MediboxConfig,
    catalog: Arc<Catalog>,
    reminders: SharedReminders,
    notices: Arc<NotificationCenter>,
    clock: Arc<dyn Clock>,
    offline: bool,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("medicines", &self.catalog.len())
            .field("reminders", &self.reminders.lock().len())
            .field("offline", &self.offline)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Fetch the catalog, open storage and load reminders.
    ///
    /// # Errors
    /// Returns the [`DataError`] of a failed dataset load; show its
    /// [`user_message`](DataError::user_message) and fall back to
    /// [`AppContext::offline`] to keep reminders working.
    pub async fn bootstrap(config: MediboxConfig) -> Result<Self, DataError> {
        let client = CatalogClient::from_config(&config.catalog)?;
        let medicines = client.fetch().await?;
        let catalog = Catalog::with_config(medicines, &config.search);
        let storage = open_storage(&config.storage);
        Ok(Self::new(config, catalog, storage))
    }

    /// A context with an empty catalog; only reminders are usable.
    #[must_use]
    pub fn offline(config: MediboxConfig) -> Self {
        let catalog = Catalog::with_config(Vec::new(), &config.search);
        let storage = open_storage(&config.storage);
        let mut context = Self::new(config, catalog, storage);
        context.offline = true;
        context
    }

    /// Assemble a context from already-built parts.
    #[must_use]
    pub fn new(config: MediboxConfig, catalog: Catalog, storage: Box<dyn KeyValueStore>) -> Self {
        let reminders = ReminderStore::load(storage, config.reminders.storage_key.clone());
        info!(
            medicines = catalog.len(),
            reminders = reminders.len(),
            "Application context ready"
        );
        let notices = NotificationCenter::new(config.reminders.notification_ttl());
        Self {
            catalog: Arc::new(catalog),
            reminders: Arc::new(Mutex::new(reminders)),
            notices: Arc::new(notices),
            clock: Arc::new(SystemClock),
            offline: false,
            config,
        }
    }

    /// Replace the wall clock used by the scheduler and by new reminders.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MediboxConfig {
        &self.config
    }

    /// The loaded catalog (empty when offline).
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Whether the dataset failed to load.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// The shared reminder store.
    #[must_use]
    pub fn reminders(&self) -> &SharedReminders {
        &self.reminders
    }

    /// The notification center.
    #[must_use]
    pub fn notices(&self) -> &Arc<NotificationCenter> {
        &self.notices
    }

    /// The clock everything in this context reads.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Trigger rules from `[reminders]`.
    #[must_use]
    pub fn policy(&self) -> TriggerPolicy {
        TriggerPolicy::from_secs(self.config.reminders.match_window_secs)
    }

    /// Create a reminder stamped with the context clock.
    ///
    /// # Errors
    /// Rejects an empty name or a time that is not `HH:MM`.
    pub fn add_reminder(&self, new: NewReminder) -> medibox_core::error::Result<Reminder> {
        let now = self.clock.now();
        self.reminders.lock().add(new, now)
    }

    /// Delete a reminder. Returns whether it existed.
    pub fn remove_reminder(&self, id: ReminderId) -> bool {
        self.reminders.lock().remove(id)
    }

    /// Snapshot of the reminder list in stored order.
    #[must_use]
    pub fn list_reminders(&self) -> Vec<Reminder> {
        self.reminders.lock().list().to_vec()
    }

    /// Start polling reminders on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start_scheduler(&self) -> SchedulerHandle {
        ReminderScheduler::new(
            Arc::clone(&self.reminders),
            Arc::clone(&self.clock),
            Arc::clone(&self.notices),
            self.policy(),
        )
        .spawn(self.config.reminders.poll_interval())
    }

    /// A fresh debounced search session over the catalog.
    #[must_use]
    pub fn search_session(&self) -> SearchSession {
        SearchSession::new(Arc::clone(&self.catalog), &self.config.search)
    }
}

/// Open the configured store, degrading to memory when the database is unusable.
fn open_storage(config: &StorageConfig) -> Box<dyn KeyValueStore> {
    storage::open_configured(config).unwrap_or_else(|e| {
        warn!(error = %e, "Cannot open reminder storage, keeping reminders in memory");
        Box::new(MemoryStore::new())
    })
}
