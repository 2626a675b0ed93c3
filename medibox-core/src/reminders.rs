//! The reminder store.
//!
//! Owns the ordered reminder list and mirrors it into a [`KeyValueStore`]
//! under a single key as a JSON array. The list is read once at load and the
//! whole collection is rewritten after every mutation.
//!
//! Storage failures never surface to callers of the mutating operations: a
//! failed read yields an empty list, a failed write is logged and the
//! in-memory list stays authoritative for the rest of the session.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::error::{MediboxError, Result};
use crate::schedule::{self, Trigger, TriggerPolicy};
use crate::storage::KeyValueStore;
use crate::types::{NewReminder, Reminder, ReminderEdit, ReminderId, parse_time_of_day};

/// Ordered reminder collection backed by key/value storage.
pub struct ReminderStore {
    storage: Box<dyn KeyValueStore>,
    key: String,
    reminders: Vec<Reminder>,
    last_persist_error: Option<String>,
}

impl std::fmt::Debug for ReminderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderStore")
            .field("key", &self.key)
            .field("reminders", &self.reminders.len())
            .field("last_persist_error", &self.last_persist_error)
            .finish_non_exhaustive()
    }
}

impl ReminderStore {
    /// Load the reminder list stored under `key`.
    ///
    /// A missing key, a read failure or unparseable JSON all yield an empty
    /// store; the latter two are logged.
    #[must_use]
    pub fn load(storage: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let reminders = match storage.get_item(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Reminder>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored reminders are not valid JSON, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read stored reminders, starting empty");
                Vec::new()
            }
        };

        info!(key = %key, reminders = reminders.len(), "Reminder store loaded");

        Self {
            storage,
            key,
            reminders,
            last_persist_error: None,
        }
    }

    /// All reminders in stored order.
    #[must_use]
    pub fn list(&self) -> &[Reminder] {
        &self.reminders
    }

    /// Look up one reminder.
    #[must_use]
    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    /// Number of reminders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    /// Whether there are no reminders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// The storage key this store writes to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Error text of the last failed write, cleared by the next success.
    #[must_use]
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Validate and append a reminder, then persist.
    ///
    /// The id is derived from `now`, bumped until it is unique.
    ///
    /// # Errors
    /// Returns [`MediboxError::InvalidReminder`] for an empty name or a time
    /// that is not `HH:MM`.
    pub fn add(&mut self, new: NewReminder, now: NaiveDateTime) -> Result<Reminder> {
        let medicine_name = validate_name(&new.medicine_name)?;
        let time = validate_time(&new.time)?;

        let reminder = Reminder {
            id: self.next_id(now),
            medicine_name,
            time,
            medicine_id: new.medicine_id,
            last_triggered: None,
        };
        info!(reminder = %reminder.id, medicine = %reminder.medicine_name, time = %reminder.time, "Reminder added");

        self.reminders.push(reminder.clone());
        self.persist();
        Ok(reminder)
    }

    /// Remove exactly the reminder with `id` and persist the reduced list.
    /// Returns `false` (and writes nothing) when no such reminder exists.
    pub fn remove(&mut self, id: ReminderId) -> bool {
        let before = self.reminders.len();
        self.reminders.retain(|r| r.id != id);
        if self.reminders.len() == before {
            debug!(reminder = %id, "Remove ignored, no such reminder");
            return false;
        }
        info!(reminder = %id, "Reminder removed");
        self.persist();
        true
    }

    /// Apply `edit` to the reminder with `id` and persist.
    ///
    /// A different time of day clears `last_triggered` so the new time can
    /// fire today; a respelling of the same time (`9:00` for `09:00`) does not.
    ///
    /// # Errors
    /// Returns [`MediboxError::ReminderNotFound`] for an unknown id, or
    /// [`MediboxError::InvalidReminder`] if an edited field is invalid.
    pub fn update(&mut self, id: ReminderId, edit: ReminderEdit) -> Result<Reminder> {
        let name = edit.medicine_name.as_deref().map(validate_name).transpose()?;
        let time = edit.time.as_deref().map(validate_time).transpose()?;

        let reminder = self
            .reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(MediboxError::ReminderNotFound(id))?;

        if let Some(name) = name {
            reminder.medicine_name = name;
        }
        if let Some(time) = time {
            if parse_time_of_day(&time) != reminder.time_of_day() {
                reminder.last_triggered = None;
            }
            reminder.time = time;
        }
        if let Some(medicine_id) = edit.medicine_id {
            reminder.medicine_id = medicine_id;
        }

        let updated = reminder.clone();
        info!(reminder = %id, "Reminder updated");
        self.persist();
        Ok(updated)
    }

    /// Run one poll tick at `now`. Persists when anything fired.
    pub fn poll(&mut self, now: NaiveDateTime, policy: &TriggerPolicy) -> Vec<Trigger> {
        let fired = schedule::evaluate(&mut self.reminders, now, policy);
        if !fired.is_empty() {
            self.persist();
        }
        fired
    }

    /// Write the whole list to storage.
    ///
    /// # Errors
    /// Returns [`MediboxError::Serialization`] or the storage error.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.reminders)
            .map_err(|e| MediboxError::Serialization(e.to_string()))?;
        self.storage.set_item(&self.key, &json)?;
        debug!(key = %self.key, reminders = self.reminders.len(), bytes = json.len(), "Reminders saved");
        Ok(())
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(()) => self.last_persist_error = None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to persist reminders, keeping in-memory state");
                self.last_persist_error = Some(e.to_string());
            }
        }
    }

    fn next_id(&self, now: NaiveDateTime) -> ReminderId {
        let mut id = ReminderId::from_timestamp(now);
        while self.reminders.iter().any(|r| r.id == id) {
            id.0 += 1;
        }
        id
    }
}

fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(MediboxError::invalid("medicine name is empty"));
    }
    Ok(name.to_string())
}

fn validate_time(raw: &str) -> Result<String> {
    let time = raw.trim();
    if parse_time_of_day(time).is_none() {
        return Err(MediboxError::invalid(format!("time {time:?} is not HH:MM")));
    }
    Ok(time.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
