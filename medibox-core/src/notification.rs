//! Single-slot notification state.
//!
//! At most one notice is visible. Showing a new one overwrites the message
//! and restarts its expiry; dismissal clears the slot and nothing else.

use chrono::{NaiveDateTime, TimeDelta};

use crate::schedule::Trigger;
use crate::types::ReminderId;

/// A visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Text shown to the user.
    pub message: String,
    /// The reminder that raised it, if any.
    pub reminder_id: Option<ReminderId>,
    /// When it became visible.
    pub shown_at: NaiveDateTime,
}

impl Notice {
    /// Free-standing notice.
    #[must_use]
    pub fn new(message: impl Into<String>, shown_at: NaiveDateTime) -> Self {
        Self {
            message: message.into(),
            reminder_id: None,
            shown_at,
        }
    }
}

impl From<&Trigger> for Notice {
    fn from(trigger: &Trigger) -> Self {
        Self {
            message: trigger.message.clone(),
            reminder_id: Some(trigger.reminder_id),
            shown_at: trigger.fired_at,
        }
    }
}

/// The notification slot with its expiry.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    current: Option<Notice>,
    expires_at: Option<NaiveDateTime>,
}

impl NotificationState {
    /// Empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `notice` for `ttl`, replacing whatever was visible.
    pub fn show(&mut self, notice: Notice, ttl: TimeDelta) {
        self.expires_at = Some(notice.shown_at + ttl);
        self.current = Some(notice);
    }

    /// Clear the slot if its notice has expired at `now`. Returns `true` if
    /// something was cleared.
    pub fn expire(&mut self, now: NaiveDateTime) -> bool {
        match self.expires_at {
            Some(deadline) if now >= deadline => {
                self.dismiss();
                true
            }
            _ => false,
        }
    }

    /// Clear the slot (user acknowledgement).
    pub fn dismiss(&mut self) {
        self.current = None;
        self.expires_at = None;
    }

    /// The visible notice.
    #[must_use]
    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    /// When the visible notice expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<NaiveDateTime> {
        self.expires_at
    }
}
