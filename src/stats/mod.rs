//! Local usage statistics store.
//!
//! A small SQLite key-value table holding anonymous counters and timestamps.
//! Every store carries an install identifier generated the first time the
//! database is opened. Nothing here is shared with credential resolution.
use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::errors::StatsError;

/// Key holding the install identifier.
pub const INSTALL_ID_KEY: &str = "install_id";
pub const COMMAND_COUNT_KEY: &str = "command_count";
pub const LAST_COMMAND_AT_KEY: &str = "last_command_at";

const INSTALL_ID_BYTES: usize = 32;

// `value` has no declared type so integers and text keep their storage class.
const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value NOT NULL
);
";

pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    /// Open or create a store at `path` and make sure it has an install id.
    ///
    /// # Errors
    /// Returns `StatsError` if the file cannot be created or opened, or the schema fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StatsError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self::with_connection(conn)?;
        tracing::debug!(path = %path.display(), "opened stats database");
        Ok(db)
    }

    /// Create an in-memory store (for testing).
    ///
    /// # Errors
    /// Returns `StatsError` if SQLite cannot be initialised.
    pub fn in_memory() -> Result<Self, StatsError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StatsError> {
        conn.execute_batch(SCHEMA)?;
        let db = Self { conn };
        db.ensure_initialized()?;
        Ok(db)
    }

    /// Store a fresh install id unless one already exists.
    ///
    /// # Errors
    /// Returns `StatsError` on database or randomness failure.
    pub fn ensure_initialized(&self) -> Result<(), StatsError> {
        if !self.get_string_value(INSTALL_ID_KEY)?.is_empty() {
            return Ok(());
        }
        let id = generate_install_id()?;
        self.set_string_value(INSTALL_ID_KEY, &id)?;
        tracing::info!("generated new install id");
        Ok(())
    }

    /// # Errors
    /// Returns `StatsError` on database failure.
    pub fn install_id(&self) -> Result<String, StatsError> {
        self.get_string_value(INSTALL_ID_KEY)
    }

    /// Value stored under `key`, or an empty string.
    ///
    /// # Errors
    /// Returns `StatsError::Sqlite` on database failure or if the value is not text.
    pub fn get_string_value(&self, key: &str) -> Result<String, StatsError> {
        Ok(self.get::<String>(key)?.unwrap_or_default())
    }

    /// # Errors
    /// Returns `StatsError::Sqlite` on database failure.
    pub fn set_string_value(&self, key: &str, value: &str) -> Result<(), StatsError> {
        self.set(key, value)
    }

    /// Value stored under `key`, or 0.
    ///
    /// # Errors
    /// Returns `StatsError::Sqlite` on database failure or if the value is not an integer.
    pub fn get_int_value(&self, key: &str) -> Result<i64, StatsError> {
        Ok(self.get::<i64>(key)?.unwrap_or(0))
    }

    /// # Errors
    /// Returns `StatsError::Sqlite` on database failure.
    pub fn set_int_value(&self, key: &str, value: i64) -> Result<(), StatsError> {
        self.set(key, value)
    }

    /// Timestamp stored under `key`; `None` when never set.
    ///
    /// # Errors
    /// Returns `StatsError::InvalidTime` if the stored text is not RFC 3339.
    pub fn get_time_value(&self, key: &str) -> Result<Option<DateTime<Utc>>, StatsError> {
        let Some(raw) = self.get::<String>(key)? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| StatsError::InvalidTime { key: key.to_string(), value: raw })
    }

    /// # Errors
    /// Returns `StatsError::Sqlite` on database failure.
    pub fn set_time_value(&self, key: &str, value: DateTime<Utc>) -> Result<(), StatsError> {
        self.set(key, value.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    /// Bump the command counter and stamp the time of this run.
    ///
    /// # Errors
    /// Returns `StatsError` on database failure.
    pub fn record_command(&self, at: DateTime<Utc>) -> Result<i64, StatsError> {
        let count = self.get_int_value(COMMAND_COUNT_KEY)?.saturating_add(1);
        self.set_int_value(COMMAND_COUNT_KEY, count)?;
        self.set_time_value(LAST_COMMAND_AT_KEY, at)?;
        Ok(count)
    }

    /// # Errors
    /// Returns `StatsError::Sqlite` if SQLite fails to flush and close.
    pub fn close(self) -> Result<(), StatsError> {
        self.conn.close().map_err(|(_, e)| StatsError::Sqlite(e))
    }

    fn get<T: rusqlite::types::FromSql>(&self, key: &str) -> Result<Option<T>, StatsError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set<T: rusqlite::ToSql>(&self, key: &str, value: T) -> Result<(), StatsError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// New random install identifier: 64 lowercase hex characters.
///
/// # Errors
/// Returns `StatsError::Random` if the OS random source fails.
pub fn generate_install_id() -> Result<String, StatsError> {
    let mut bytes = [0u8; INSTALL_ID_BYTES];
    rand::rngs::OsRng.try_fill_bytes(&mut bytes).map_err(|e| StatsError::Random(e.to_string()))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_has_install_id() {
        let db = StatsDb::in_memory().unwrap();
        let id = db.install_id().unwrap();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn independent_stores_get_independent_ids() {
        let a = StatsDb::in_memory().unwrap();
        let b = StatsDb::in_memory().unwrap();
        assert_ne!(a.install_id().unwrap(), b.install_id().unwrap());
    }

    #[test]
    fn ensure_initialized_keeps_existing_id() {
        let db = StatsDb::in_memory().unwrap();
        let first = db.install_id().unwrap();
        db.ensure_initialized().unwrap();
        assert_eq!(db.install_id().unwrap(), first);
    }

    #[test]
    fn record_command_counts_up() {
        let db = StatsDb::in_memory().unwrap();
        let now = Utc::now();
        assert_eq!(db.record_command(now).unwrap(), 1);
        assert_eq!(db.record_command(now).unwrap(), 2);
        assert_eq!(db.get_time_value(LAST_COMMAND_AT_KEY).unwrap(), Some(now));
    }

    #[test]
    fn garbage_time_is_an_error() {
        let db = StatsDb::in_memory().unwrap();
        db.set_string_value("t", "yesterday").unwrap();
        assert!(matches!(db.get_time_value("t"), Err(StatsError::InvalidTime { .. })));
    }
}
