//! Integration Tests — end-to-end search and reminder flows.
//!
//! Each test walks a user-visible scenario through the public API: load a
//! dataset, search it, create reminders, poll them, reload from storage.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use medibox_core::config::{MediboxConfig, StorageConfig};
use medibox_core::notification::{Notice, NotificationState};
use medibox_core::schedule::{Clock, ManualClock, TriggerPolicy};
use medibox_core::storage::{KeyValueStore, MemoryStore, SqliteStore};
use medibox_core::{Catalog, Medicine, NewReminder, ReminderStore};

const KEY: &str = "medicineReminders";

fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .expect("valid datetime")
}

fn dataset_json() -> &'static str {
    r#"[
        {"id": 1, "name": "Paracetamol", "uses": ["Fever", "Pain"], "sideEffects": ["Nausea"],
         "substitutes": ["Crocin"], "chemicalClass": "Anilide", "habitForming": "No",
         "therapeuticClass": "PAIN ANALGESICS", "actionClass": "Analgesic"},
        {"id": 2, "name": "Crocin", "uses": ["Fever"], "sideEffects": [], "substitutes": ["Paracetamol"],
         "chemicalClass": "Anilide", "habitForming": "No", "therapeuticClass": "PAIN ANALGESICS",
         "actionClass": "Analgesic"},
        {"id": 3, "name": "Alprazolam", "uses": ["Anxiety"], "sideEffects": ["Drowsiness"],
         "substitutes": [], "chemicalClass": "Benzodiazepines", "habitForming": "Yes",
         "therapeuticClass": "NEURO CNS", "actionClass": "Benzodiazepine"}
    ]"#
}

fn catalog() -> Catalog {
    let medicines: Vec<Medicine> = serde_json::from_str(dataset_json()).expect("dataset");
    Catalog::new(medicines)
}

// ---------------------------------------------------------------------------
// Search scenarios
// ---------------------------------------------------------------------------

#[test]
fn fever_finds_paracetamol_and_xyz_finds_nothing() {
    let catalog = catalog();

    let fever = catalog.search("fever");
    assert!(fever.initiated);
    assert!(fever.hits.iter().any(|m| m.name == "Paracetamol"));

    let xyz = catalog.search("xyz");
    assert!(xyz.initiated, "search ran even though nothing matched");
    assert!(xyz.is_empty());
}

#[test]
fn detail_view_flow() {
    let catalog = catalog();
    let hit = catalog.search("alpra").hits[0];
    let detail = catalog.get(hit.id).expect("detail");
    assert!(detail.is_habit_forming());
    assert_eq!(detail.side_effects, vec!["Drowsiness"]);

    let subs: Vec<&str> = catalog.substitutes_of(1).iter().map(|m| m.name.as_str()).collect();
    assert_eq!(subs, vec!["Crocin"]);
}

// ---------------------------------------------------------------------------
// Reminder scenarios
// ---------------------------------------------------------------------------

#[test]
fn reminder_fires_once_with_message() {
    let clock = ManualClock::new(at(1, 8, 0, 0));
    let policy = TriggerPolicy::default();
    let mut store = ReminderStore::load(Box::new(MemoryStore::new()), KEY);
    let catalog = catalog();
    let paracetamol = catalog.suggest("para")[0];
    store
        .add(NewReminder::for_medicine(paracetamol, "09:00"), clock.now())
        .expect("add");

    clock.set(at(1, 9, 0, 30));
    let fired = store.poll(clock.now(), &policy);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].message, "Time to take Paracetamol!");
    assert_eq!(store.list()[0].last_triggered, Some(at(1, 9, 0, 30)));

    clock.advance(TimeDelta::seconds(5));
    assert!(store.poll(clock.now(), &policy).is_empty());
}

#[test]
fn reminder_round_trip_through_sqlite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("medibox.db");
    let config = StorageConfig::default();

    let added = {
        let storage = SqliteStore::open(&path, &config).expect("open");
        let mut store = ReminderStore::load(Box::new(storage), KEY);
        let mut new = NewReminder::new("Crocin", "21:15");
        new.medicine_id = Some(2);
        store.add(new, at(1, 20, 0, 0)).expect("add")
    };

    let storage = SqliteStore::open(&path, &config).expect("reopen");
    let reloaded = ReminderStore::load(Box::new(storage), KEY);
    assert_eq!(reloaded.list(), &[added]);
}

#[test]
fn delete_persists_reduced_list() {
    let backing = MemoryStore::new();
    let mut store = ReminderStore::load(Box::new(backing.clone()), KEY);
    let keep = store.add(NewReminder::new("Keep", "08:00"), at(1, 7, 0, 0)).expect("add");
    let gone = store.add(NewReminder::new("Drop", "20:00"), at(1, 7, 0, 1)).expect("add");

    assert!(store.remove(gone.id));

    let reloaded = ReminderStore::load(Box::new(backing), KEY);
    assert_eq!(reloaded.list(), &[keep]);
}

#[test]
fn lossy_notification_shows_last_trigger_of_tick() {
    let mut store = ReminderStore::load(Box::new(MemoryStore::new()), KEY);
    store.add(NewReminder::new("Morning A", "09:00"), at(1, 7, 0, 0)).expect("add");
    store.add(NewReminder::new("Morning B", "09:00"), at(1, 7, 0, 1)).expect("add");

    let mut notices = NotificationState::new();
    for trigger in store.poll(at(1, 9, 0, 0), &TriggerPolicy::default()) {
        notices.show(Notice::from(&trigger), TimeDelta::seconds(5));
    }
    assert_eq!(
        notices.current().map(|n| n.message.as_str()),
        Some("Time to take Morning B!")
    );
    assert!(notices.expire(at(1, 9, 0, 5)));
    // Dismissal leaves the records alone.
    assert!(store.list().iter().all(|r| r.last_triggered.is_some()));
}

#[test]
fn full_day_cycle() {
    let clock = ManualClock::new(at(1, 6, 0, 0));
    let policy = TriggerPolicy::default();
    let mut store = ReminderStore::load(Box::new(MemoryStore::new()), KEY);
    store.add(NewReminder::new("Vitamin D", "07:00"), clock.now()).expect("add");

    // Poll every 10 seconds for two days; expect exactly two firings.
    let mut fired = 0;
    while clock.now() < at(3, 6, 0, 0) {
        fired += store.poll(clock.now(), &policy).len();
        clock.advance(TimeDelta::seconds(10));
    }
    assert_eq!(fired, 2);
}

#[test]
fn config_drives_policy_and_key() {
    let config = MediboxConfig::from_toml(
        r#"
        [reminders]
        storage_key = "customKey"
        match_window_secs = 120
        "#,
    )
    .expect("config");
    let backing = MemoryStore::new();
    let mut store = ReminderStore::load(Box::new(backing.clone()), config.reminders.storage_key.clone());
    store.add(NewReminder::new("Late", "09:00"), at(1, 7, 0, 0)).expect("add");
    assert!(backing.get_item("customKey").expect("get").is_some());

    let policy = TriggerPolicy::from_secs(config.reminders.match_window_secs);
    assert_eq!(store.poll(at(1, 9, 1, 30), &policy).len(), 1);
}
