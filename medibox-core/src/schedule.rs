//! Reminder trigger rules.
//!
//! A reminder is either ARMED or FIRED-TODAY. A poll tick moves it from
//! ARMED to FIRED-TODAY when `now` is within the match window of today's
//! instance of its target time. FIRED-TODAY is keyed on the calendar date of
//! `last_triggered`, so the reminder re-arms at local midnight and can never
//! fire twice on one day, whatever the clock does between polls.
//!
//! Everything here is pure; the wall clock is injected through [`Clock`].

use chrono::{Local, NaiveDateTime, TimeDelta};
use parking_lot::Mutex;
use tracing::debug;

use crate::types::{Reminder, ReminderId};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local date and time, without timezone.
    fn now(&self) -> NaiveDateTime;
}

/// The real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Clock frozen at `at`.
    #[must_use]
    pub fn new(at: NaiveDateTime) -> Self {
        Self { now: Mutex::new(at) }
    }

    /// Jump to `at`.
    pub fn set(&self, at: NaiveDateTime) {
        *self.now.lock() = at;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

// ---------------------------------------------------------------------------
// Policy & triggers
// ---------------------------------------------------------------------------

/// Tuning for the trigger test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPolicy {
    /// A reminder matches while `|now - target| < match_window`.
    pub match_window: TimeDelta,
}

impl TriggerPolicy {
    /// Policy with a window of `secs` seconds, capped at one day.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs.min(86_400)).unwrap_or(86_400);
        Self {
            match_window: TimeDelta::seconds(secs),
        }
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self::from_secs(60)
    }
}

/// One reminder firing during a poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Which reminder fired.
    pub reminder_id: ReminderId,
    /// Its medicine name at the time of firing.
    pub medicine_name: String,
    /// Notification text, `"Time to take <name>!"`.
    pub message: String,
    /// When it fired.
    pub fired_at: NaiveDateTime,
}

/// Whether `reminder` should fire at `now`.
///
/// Malformed times never match; that is not treated as an error.
#[must_use]
pub fn is_due(reminder: &Reminder, now: NaiveDateTime, policy: &TriggerPolicy) -> bool {
    let Some(target_time) = reminder.time_of_day() else {
        debug!(reminder = %reminder.id, time = %reminder.time, "Unparseable reminder time, skipping");
        return false;
    };
    if reminder.triggered_on(now.date()) {
        return false;
    }
    let target = now.date().and_time(target_time);
    (now - target).abs() < policy.match_window
}

/// Run one poll tick over `reminders` in stored order.
///
/// Every due reminder gets `last_triggered = now` and yields a [`Trigger`].
pub fn evaluate(reminders: &mut [Reminder], now: NaiveDateTime, policy: &TriggerPolicy) -> Vec<Trigger> {
    let mut fired = Vec::new();
    for reminder in reminders.iter_mut() {
        if !is_due(reminder, now, policy) {
            continue;
        }
        reminder.last_triggered = Some(now);
        fired.push(Trigger {
            reminder_id: reminder.id,
            medicine_name: reminder.medicine_name.clone(),
            message: reminder.message(),
            fired_at: now,
        });
    }
    fired
}
