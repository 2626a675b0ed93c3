//! Core type definitions for Medibox.
//!
//! All record types are serializable. Field names on the wire are camelCase,
//! matching the dataset and the persisted reminder list.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a reminder, derived from its creation time in
/// milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(pub i64);

impl ReminderId {
    /// Derive an ID from a local wall-clock time: milliseconds since the
    /// Unix epoch. A time skipped by a DST jump is read as UTC.
    #[must_use]
    pub fn from_timestamp(at: NaiveDateTime) -> Self {
        let millis = Local
            .from_local_datetime(&at)
            .earliest()
            .map_or_else(|| at.and_utc().timestamp_millis(), |local| local.timestamp_millis());
        Self(millis)
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Medicine
// ---------------------------------------------------------------------------

/// One record of the medicine dataset.
///
/// Immutable once loaded; the [`Catalog`](crate::catalog::Catalog) owns the
/// collection for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    /// Dataset identifier, unique within a dataset.
    pub id: u32,
    /// Brand or generic name.
    pub name: String,
    /// Use cases / symptoms this medicine treats.
    #[serde(default, deserialize_with = "null_as_default")]
    pub uses: Vec<String>,
    /// Known side effects.
    #[serde(default, alias = "side_effects", deserialize_with = "null_as_default")]
    pub side_effects: Vec<String>,
    /// Names of substitute medicines.
    #[serde(default, deserialize_with = "null_as_default")]
    pub substitutes: Vec<String>,
    /// Chemical class.
    #[serde(
        default,
        alias = "chemical_class",
        alias = "Chemical Class",
        deserialize_with = "null_as_default"
    )]
    pub chemical_class: String,
    /// Habit-forming flag as it appears in the dataset ("Yes" / "No").
    #[serde(
        default,
        alias = "habit_forming",
        alias = "Habit Forming",
        deserialize_with = "null_as_default"
    )]
    pub habit_forming: String,
    /// Therapeutic class.
    #[serde(
        default,
        alias = "therapeutic_class",
        alias = "Therapeutic Class",
        deserialize_with = "null_as_default"
    )]
    pub therapeutic_class: String,
    /// Action class.
    #[serde(
        default,
        alias = "action_class",
        alias = "Action Class",
        deserialize_with = "null_as_default"
    )]
    pub action_class: String,
}

impl Medicine {
    /// Minimal record with only an id and name; everything else empty.
    #[must_use]
    pub fn named(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            uses: Vec::new(),
            side_effects: Vec::new(),
            substitutes: Vec::new(),
            chemical_class: String::new(),
            habit_forming: String::new(),
            therapeutic_class: String::new(),
            action_class: String::new(),
        }
    }

    /// Builder-style setter for the use-case list.
    #[must_use]
    pub fn with_uses<I, S>(mut self, uses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uses = uses.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style setter for the substitute list.
    #[must_use]
    pub fn with_substitutes<I, S>(mut self, substitutes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.substitutes = substitutes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the dataset flags this medicine as habit forming.
    #[must_use]
    pub fn is_habit_forming(&self) -> bool {
        let flag = self.habit_forming.trim();
        flag.eq_ignore_ascii_case("yes") || flag.eq_ignore_ascii_case("true")
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Reminders
// ---------------------------------------------------------------------------

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day.
///
/// Returns `None` for anything else; callers treat that as "never matches".
#[must_use]
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// A user-defined (medicine, time-of-day) pair with trigger bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Unique within a store.
    pub id: ReminderId,
    /// Denormalized copy of the medicine name.
    pub medicine_name: String,
    /// Target time of day, `HH:MM`, local time. Kept raw so that malformed
    /// persisted values survive a load/save cycle.
    pub time: String,
    /// Dataset id of the medicine, when picked from suggestions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medicine_id: Option<u32>,
    /// When this reminder last fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<NaiveDateTime>,
}

impl Reminder {
    /// The parsed target time, or `None` if `time` is malformed.
    #[must_use]
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }

    /// Whether this reminder already fired on `date`.
    #[must_use]
    pub fn triggered_on(&self, date: NaiveDate) -> bool {
        self.last_triggered.is_some_and(|at| at.date() == date)
    }

    /// The notification text shown when this reminder fires.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Time to take {}!", self.medicine_name)
    }
}

/// User input for a new reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    /// Medicine name as typed or picked.
    pub medicine_name: String,
    /// Target time, `HH:MM`.
    pub time: String,
    /// Dataset id when picked from suggestions.
    pub medicine_id: Option<u32>,
}

impl NewReminder {
    /// Reminder for a free-text medicine name.
    #[must_use]
    pub fn new(medicine_name: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            medicine_name: medicine_name.into(),
            time: time.into(),
            medicine_id: None,
        }
    }

    /// Reminder for a medicine picked from the catalog.
    #[must_use]
    pub fn for_medicine(medicine: &Medicine, time: impl Into<String>) -> Self {
        Self {
            medicine_name: medicine.name.clone(),
            time: time.into(),
            medicine_id: Some(medicine.id),
        }
    }
}

/// Partial update of an existing reminder. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderEdit {
    /// New medicine name.
    pub medicine_name: Option<String>,
    /// New target time; re-arms the reminder.
    pub time: Option<String>,
    /// New medicine reference (`Some(None)` clears it).
    pub medicine_id: Option<Option<u32>>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid datetime")
    }

    #[test]
    fn medicine_parses_camel_case_record() {
        let json = r#"{
            "id": 1,
            "name": "Paracetamol",
            "uses": ["Fever", "Pain"],
            "sideEffects": ["Nausea"],
            "substitutes": ["Crocin"],
            "chemicalClass": "Anilide",
            "habitForming": "No",
            "therapeuticClass": "PAIN ANALGESICS",
            "actionClass": "Analgesic"
        }"#;
        let med: Medicine = serde_json::from_str(json).expect("parse");
        assert_eq!(med.name, "Paracetamol");
        assert_eq!(med.uses, vec!["Fever", "Pain"]);
        assert_eq!(med.side_effects, vec!["Nausea"]);
        assert_eq!(med.chemical_class, "Anilide");
        assert!(!med.is_habit_forming());
    }

    #[test]
    fn medicine_tolerates_missing_and_null_fields() {
        let json = r#"{"id": 7, "name": "Mystery", "uses": null, "Habit Forming": "Yes"}"#;
        let med: Medicine = serde_json::from_str(json).expect("parse");
        assert!(med.uses.is_empty());
        assert!(med.substitutes.is_empty());
        assert!(med.is_habit_forming());
    }

    #[test]
    fn time_of_day_parsing() {
        assert_eq!(parse_time_of_day("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_time_of_day(" 21:45 "), NaiveTime::from_hms_opt(21, 45, 0));
        assert_eq!(parse_time_of_day("07:30:15"), NaiveTime::from_hms_opt(7, 30, 15));
        assert!(parse_time_of_day("soon").is_none());
        assert!(parse_time_of_day("25:00").is_none());
        assert!(parse_time_of_day("").is_none());
    }

    #[test]
    fn reminder_wire_format_is_camel_case() {
        let reminder = Reminder {
            id: ReminderId(1_700_000_000_000),
            medicine_name: "Paracetamol".into(),
            time: "09:00".into(),
            medicine_id: Some(1),
            last_triggered: None,
        };
        let json = serde_json::to_value(&reminder).expect("serialize");
        assert_eq!(json["id"], 1_700_000_000_000_i64);
        assert_eq!(json["medicineName"], "Paracetamol");
        assert_eq!(json["medicineId"], 1);
        assert!(json.get("lastTriggered").is_none());
    }

    #[test]
    fn triggered_on_compares_calendar_day() {
        let mut reminder = Reminder {
            id: ReminderId(1),
            medicine_name: "Ibuprofen".into(),
            time: "09:00".into(),
            medicine_id: None,
            last_triggered: Some(at(9, 0, 10)),
        };
        assert!(reminder.triggered_on(at(23, 59, 59).date()));
        assert!(!reminder.triggered_on(at(0, 0, 0).date().succ_opt().expect("next day")));
        reminder.last_triggered = None;
        assert!(!reminder.triggered_on(at(9, 0, 0).date()));
    }

    #[test]
    fn reminder_message() {
        let reminder = Reminder {
            id: ReminderId(1),
            medicine_name: "Aspirin".into(),
            time: "08:00".into(),
            medicine_id: None,
            last_triggered: None,
        };
        assert_eq!(reminder.message(), "Time to take Aspirin!");
    }

    #[test]
    fn id_from_local_now_is_epoch_millis() {
        let id = ReminderId::from_timestamp(Local::now().naive_local());
        let epoch_ms = chrono::Utc::now().timestamp_millis();
        assert!((epoch_ms - id.0).abs() < 5_000, "id {} vs epoch {epoch_ms}", id.0);
    }

    #[test]
    fn id_from_timestamp_is_millis() {
        let id = ReminderId::from_timestamp(at(0, 0, 1));
        let base = ReminderId::from_timestamp(at(0, 0, 0));
        assert_eq!(id.0 - base.0, 1000);
    }
}
