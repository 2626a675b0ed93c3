//! Key/value storage for Medibox state.
//!
//! A small string-to-string store in the spirit of browser local storage.
//! The reminder list lives under a single key as a JSON array.
//!
//! [`SqliteStore`] is the durable backend. Its schema is intentionally simple:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS local_storage (
//!     key        TEXT PRIMARY KEY,
//!     value      TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! - WAL mode so a reader never blocks the writer.
//! - Optional CRC-32 checksum detects a corrupted value; a mismatch is logged
//!   and the value is still returned.
//!
//! [`MemoryStore`] keeps everything in process and is used for tests and
//! sessions without a configured path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::config::StorageConfig;
use crate::error::Result;

/// A string key/value store.
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Returns `true` if something was removed.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<bool>;
}

/// Open the store described by `config`: `SQLite` on disk when a path is set,
/// otherwise in memory.
///
/// # Errors
/// Returns [`MediboxError::Storage`](crate::MediboxError::Storage) if the
/// database cannot be opened.
pub fn open_configured(config: &StorageConfig) -> Result<Box<dyn KeyValueStore>> {
    match &config.path {
        Some(path) => Ok(Box::new(SqliteStore::open(path, config)?)),
        None => {
            info!("No storage path configured, reminders will not outlive this process");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 of `data` as a lowercase hex string.
fn crc32_hex(data: &[u8]) -> String {
    let crc = crc32_compute(data);
    format!("{crc:08x}")
}

/// Basic CRC-32 (ISO 3309 / ITU-T V.42) computation.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS local_storage (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// `SQLite`-backed key/value store.
///
/// ```no_run
/// # use medibox_core::storage::{KeyValueStore, SqliteStore};
/// # use medibox_core::config::StorageConfig;
/// let store = SqliteStore::open("medibox.db", &StorageConfig::default())?;
/// store.set_item("medicineReminders", "[]")?;
/// assert_eq!(store.get_item("medicineReminders")?.as_deref(), Some("[]"));
/// # Ok::<(), medibox_core::error::MediboxError>(())
/// ```
pub struct SqliteStore {
    conn: Connection,
    config: StorageConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MediboxError::Storage`](crate::MediboxError::Storage) on
    /// `SQLite` failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &StorageConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Storage opened"
        );

        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`MediboxError::Storage`](crate::MediboxError::Storage) on
    /// `SQLite` failures.
    pub fn open_in_memory(config: &StorageConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// All stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`MediboxError::Storage`](crate::MediboxError::Storage) on
    /// `SQLite` failures.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT key FROM local_storage ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `PRAGMA integrity_check`. `Ok(false)` means corruption.
    ///
    /// # Errors
    ///
    /// Returns [`MediboxError::Storage`](crate::MediboxError::Storage) if the
    /// check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let start = Instant::now();
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value, checksum FROM local_storage WHERE key = ?1")?;

        let row: Option<(String, Option<String>)> = stmt
            .query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((value, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.config.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(value.as_bytes());
                if expected != actual {
                    warn!(
                        key,
                        expected = %expected,
                        actual = %actual,
                        "Checksum mismatch, stored value may be corrupt"
                    );
                }
            }
        }

        debug!(
            key,
            bytes = value.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Read storage item"
        );
        Ok(Some(value))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let start = Instant::now();
        let checksum = self
            .config
            .checksum_enabled
            .then(|| crc32_hex(value.as_bytes()));
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![key, value, now, checksum],
        )?;

        debug!(
            key,
            bytes = value.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Wrote storage item"
        );
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(deleted > 0)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Clones share the same map, so a test can keep a handle
/// and inspect what a [`ReminderStore`](crate::reminders::ReminderStore)
/// wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        Ok(self.items.lock().remove(key).is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
