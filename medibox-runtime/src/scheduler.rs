//! Reminder polling loop.
//!
//! A Tokio interval ticks every `poll_interval`; each tick locks the shared
//! [`ReminderStore`], evaluates it against the injected clock and hands the
//! resulting triggers to the [`NotificationCenter`] in stored order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use medibox_core::ReminderStore;
use medibox_core::notification::Notice;
use medibox_core::schedule::{Clock, Trigger, TriggerPolicy};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::notify::NotificationCenter;

/// The reminder store as shared between the scheduler and its callers.
pub type SharedReminders = Arc<Mutex<ReminderStore>>;

/// Polls reminders and raises notices for the ones that fire.
pub struct ReminderScheduler {
    store: SharedReminders,
    clock: Arc<dyn Clock>,
    notices: Arc<NotificationCenter>,
    policy: TriggerPolicy,
}

impl std::fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderScheduler")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReminderScheduler {
    /// Scheduler over `store`, reading time from `clock`.
    #[must_use]
    pub fn new(
        store: SharedReminders,
        clock: Arc<dyn Clock>,
        notices: Arc<NotificationCenter>,
        policy: TriggerPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            notices,
            policy,
        }
    }

    /// Run one evaluation now.
    ///
    /// The last trigger of the tick is the notice left on screen.
    /// Must be called from within a Tokio runtime.
    pub fn tick_once(&self) -> Vec<Trigger> {
        let start = Instant::now();
        let now = self.clock.now();
        let fired = self.store.lock().poll(now, &self.policy);

        for trigger in &fired {
            info!(
                reminder = %trigger.reminder_id,
                medicine = %trigger.medicine_name,
                "Reminder fired"
            );
            self.notices.show(Notice::from(trigger));
        }

        debug!(
            fired = fired.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Reminder poll complete"
        );
        fired
    }

    /// Move the scheduler onto a background task ticking every `poll_interval`.
    ///
    /// The first tick runs immediately.
    #[must_use]
    pub fn spawn(self, poll_interval: Duration) -> SchedulerHandle {
        info!(interval_ms = poll_interval.as_millis(), "Starting reminder scheduler");
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick_once();
            }
        });
        SchedulerHandle { task }
    }
}

/// Owns the polling task; dropping it stops the polling.
#[derive(Debug)]
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop polling.
    pub fn shutdown(self) {
        info!("Stopping reminder scheduler");
        // Drop aborts the task.
    }

    /// Whether the polling task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use medibox_core::NewReminder;
    use medibox_core::schedule::ManualClock;
    use medibox_core::storage::MemoryStore;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid datetime")
    }

    fn fixture(start: NaiveDateTime) -> (SharedReminders, Arc<ManualClock>, Arc<NotificationCenter>) {
        let mut store = ReminderStore::load(Box::new(MemoryStore::new()), "medicineReminders");
        store
            .add(NewReminder::new("Aspirin", "09:00"), start)
            .expect("add");
        (
            Arc::new(Mutex::new(store)),
            Arc::new(ManualClock::new(start)),
            Arc::new(NotificationCenter::new(Duration::from_secs(5))),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn polling_fires_once_and_shows_notice() {
        let (store, clock, notices) = fixture(at(8, 0, 0));
        let scheduler = ReminderScheduler::new(
            Arc::clone(&store),
            clock.clone(),
            Arc::clone(&notices),
            TriggerPolicy::default(),
        );
        let handle = scheduler.spawn(Duration::from_secs(10));

        // Immediate first tick at 08:00 finds nothing.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(notices.current().is_none());

        clock.set(at(9, 0, 30));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            notices.current().map(|n| n.message),
            Some("Time to take Aspirin!".to_string())
        );
        assert_eq!(store.lock().list()[0].last_triggered, Some(at(9, 0, 30)));

        // Five seconds later on the wall clock: no second firing, notice expired.
        clock.advance(TimeDelta::seconds(5));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(notices.current().is_none());
        assert_eq!(store.lock().list()[0].last_triggered, Some(at(9, 0, 30)));

        assert!(handle.is_running());
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_stops_polling() {
        let (store, clock, notices) = fixture(at(8, 0, 0));
        let handle = ReminderScheduler::new(
            Arc::clone(&store),
            clock.clone(),
            Arc::clone(&notices),
            TriggerPolicy::default(),
        )
        .spawn(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(handle);

        clock.set(at(9, 0, 0));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(notices.current().is_none());
        assert!(store.lock().list()[0].last_triggered.is_none());
    }

    #[tokio::test]
    async fn tick_once_shows_last_trigger_of_the_tick() {
        let (store, clock, notices) = fixture(at(8, 0, 0));
        store
            .lock()
            .add(NewReminder::new("Ibuprofen", "09:00"), at(8, 0, 1))
            .expect("add");
        clock.set(at(9, 0, 0));

        let scheduler = ReminderScheduler::new(store, clock, Arc::clone(&notices), TriggerPolicy::default());
        let fired = scheduler.tick_once();
        assert_eq!(fired.len(), 2);
        assert_eq!(
            notices.current().map(|n| n.message),
            Some("Time to take Ibuprofen!".to_string())
        );
        assert!(scheduler.tick_once().is_empty());
    }
}
