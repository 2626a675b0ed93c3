//! The single visible notice with its auto-dismiss timer.
//!
//! Showing a notice overwrites the current one and restarts the timer, so a
//! burst of triggers leaves only the last message on screen.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use medibox_core::notification::{Notice, NotificationState};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct Shared {
    state: NotificationState,
    /// Bumped on every show/dismiss so a stale timer never clears a newer notice.
    generation: u64,
}

/// Publishes the current notice and dismisses it after a fixed TTL.
#[derive(Debug)]
pub struct NotificationCenter {
    ttl: Duration,
    shared: Arc<Mutex<Shared>>,
    tx: Arc<watch::Sender<Option<Notice>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationCenter {
    /// A center whose notices auto-dismiss after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            ttl,
            shared: Arc::new(Mutex::new(Shared::default())),
            tx: Arc::new(tx),
            timer: Mutex::new(None),
        }
    }

    /// Replace the visible notice and restart the auto-dismiss timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn show(&self, notice: Notice) {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::seconds(5));
        debug!(message = %notice.message, "Showing notice");
        // Publish under the lock so the channel never lags `current()`.
        let generation = {
            let mut shared = self.shared.lock();
            shared.generation += 1;
            shared.state.show(notice.clone(), ttl);
            self.tx.send_replace(Some(notice));
            shared.generation
        };

        let mut timer = self.timer.lock();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        let delay = self.ttl;
        let shared = Arc::clone(&self.shared);
        let tx = Arc::clone(&self.tx);
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut shared = shared.lock();
            if shared.generation == generation {
                shared.state.dismiss();
                tx.send_replace(None);
                debug!("Notice expired");
            }
        }));
    }

    /// User acknowledgement: hide the notice now. Reminder records are untouched.
    pub fn dismiss(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
        let mut shared = self.shared.lock();
        shared.generation += 1;
        if shared.state.current().is_some() {
            shared.state.dismiss();
            self.tx.send_replace(None);
        }
    }

    /// The notice on screen, if any.
    #[must_use]
    pub fn current(&self) -> Option<Notice> {
        self.shared.lock().state.current().cloned()
    }

    /// Observe notice changes; `None` means nothing is shown.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.tx.subscribe()
    }

    /// How long a notice stays up.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn notice(message: &str) -> Notice {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid datetime");
        Notice::new(message, at)
    }

    #[tokio::test(start_paused = true)]
    async fn notice_auto_dismisses_after_ttl() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        let mut rx = center.subscribe();

        center.show(notice("Time to take Aspirin!"));
        assert_eq!(
            center.current().map(|n| n.message),
            Some("Time to take Aspirin!".to_string())
        );
        assert!(rx.borrow_and_update().is_some());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(center.current().is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(center.current().is_none());
        assert!(rx.has_changed().expect("sender alive"));
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_notice_overwrites_and_restarts_timer() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.show(notice("Time to take A!"));
        tokio::time::sleep(Duration::from_secs(3)).await;
        center.show(notice("Time to take B!"));

        // The first timer would have fired at 5 s.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(
            center.current().map(|n| n.message),
            Some("Time to take B!".to_string())
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(center.current().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn channel_agrees_with_current_under_concurrent_dismiss() {
        let center = Arc::new(NotificationCenter::new(Duration::from_secs(60)));
        let rx = center.subscribe();

        for round in 0..2_000 {
            let shower = {
                let center = Arc::clone(&center);
                tokio::spawn(async move { center.show(notice(&format!("Time to take {round}!"))) })
            };
            let dismisser = {
                let center = Arc::clone(&center);
                tokio::spawn(async move { center.dismiss() })
            };
            shower.await.expect("show task");
            dismisser.await.expect("dismiss task");

            let published = rx.borrow().as_ref().map(|n| n.message.clone());
            assert_eq!(published, center.current().map(|n| n.message), "round {round}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_hides_immediately() {
        let center = NotificationCenter::new(Duration::from_secs(5));
        center.show(notice("Time to take C!"));
        center.dismiss();
        assert!(center.current().is_none());
        assert!(center.subscribe().borrow().is_none());
    }
}
