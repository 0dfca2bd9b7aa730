//! SQLite-backed presence log and gym configuration.
//!
//! Provides persistent storage for:
//! - Hourly presence samples (append-only, never updated or deleted)
//! - The gym configuration singleton row
//! - Key-value store for small engine state (e.g. the tracking flag)
//!
//! There is no locking between the background sampler and foreground
//! readers: sample writes are append-only and the rotation update is
//! idempotent per calendar day, so concurrent access converges.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};
use crate::gym::GymConfig;

/// One hour-aligned geofence observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceSample {
    pub timestamp: DateTime<Utc>,
    pub is_present: bool,
}

/// SQLite database for presence samples and gym configuration.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/gymlog/gymlog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("gymlog.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral runs).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS presence_samples (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp   TEXT NOT NULL,
                    is_present  INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS gym_config (
                    id                        INTEGER PRIMARY KEY CHECK (id = 1),
                    name                      TEXT NOT NULL,
                    latitude                  REAL NOT NULL,
                    longitude                 REAL NOT NULL,
                    last_payment_date         TEXT,
                    routine_names             TEXT NOT NULL DEFAULT '[]',
                    current_routine_index     INTEGER NOT NULL DEFAULT 0,
                    last_routine_advance_date TEXT
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_presence_samples_timestamp
                    ON presence_samples(timestamp);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Presence samples ─────────────────────────────────────────────

    /// Append one presence sample. Duplicate timestamps are allowed; the
    /// aggregator tolerates redundant same-hour rows.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn append_sample(
        &self,
        timestamp: DateTime<Utc>,
        is_present: bool,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO presence_samples (timestamp, is_present) VALUES (?1, ?2)",
            params![timestamp.to_rfc3339(), is_present as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All samples, ascending by timestamp.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored timestamp is
    /// malformed.
    pub fn all_samples(&self) -> Result<Vec<PresenceSample>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, is_present FROM presence_samples ORDER BY timestamp ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let ts: String = row.get(0)?;
            let is_present: i64 = row.get(1)?;
            let timestamp = DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc);
            Ok(PresenceSample {
                timestamp,
                is_present: is_present != 0,
            })
        })?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }

    // ── Gym configuration ────────────────────────────────────────────

    /// Write the full gym configuration singleton row.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn save_gym_config(&self, gym: &GymConfig) -> Result<(), DatabaseError> {
        let routines = serde_json::to_string(&gym.routine_names)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO gym_config
                (id, name, latitude, longitude, last_payment_date,
                 routine_names, current_routine_index, last_routine_advance_date)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                gym.name,
                gym.latitude,
                gym.longitude,
                gym.last_payment_date.map(|d| d.to_rfc3339()),
                routines,
                gym.current_routine_index as i64,
                gym.last_routine_advance_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Read the gym configuration, or `None` if never configured.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored field is malformed.
    pub fn gym_config(&self) -> Result<Option<GymConfig>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, latitude, longitude, last_payment_date,
                    routine_names, current_routine_index, last_routine_advance_date
             FROM gym_config WHERE id = 1",
        )?;
        let result = stmt.query_row([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        });

        let (name, latitude, longitude, payment, routines, index, advance) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let last_payment_date = payment
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
            .transpose()
            .map_err(|e| DatabaseError::QueryFailed(format!("bad payment date: {e}")))?;
        let routine_names: Vec<String> = serde_json::from_str(&routines)
            .map_err(|e| DatabaseError::QueryFailed(format!("bad routine list: {e}")))?;
        let last_routine_advance_date = advance
            .map(|s| s.parse::<NaiveDate>())
            .transpose()
            .map_err(|e| DatabaseError::QueryFailed(format!("bad advance date: {e}")))?;

        Ok(Some(GymConfig {
            name,
            latitude,
            longitude,
            last_payment_date,
            routine_names,
            current_routine_index: index.max(0) as usize,
            last_routine_advance_date,
        }))
    }

    /// Update only the payment date field of the singleton row.
    ///
    /// # Errors
    /// Returns an error if no gym is configured or the write fails.
    pub fn update_payment_date(
        &self,
        date: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE gym_config SET last_payment_date = ?1 WHERE id = 1",
            params![date.map(|d| d.to_rfc3339())],
        )?;
        if changed == 0 {
            return Err(DatabaseError::QueryFailed("no gym configured".into()));
        }
        Ok(())
    }

    /// Persist a rotation advance: the new index and the attendance day it
    /// was advanced for. Only the sampler writes these two fields.
    ///
    /// # Errors
    /// Returns an error if no gym is configured or the write fails.
    pub fn update_rotation(
        &self,
        new_index: usize,
        advance_date: NaiveDate,
    ) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE gym_config
             SET current_routine_index = ?1, last_routine_advance_date = ?2
             WHERE id = 1",
            params![new_index as i64, advance_date.to_string()],
        )?;
        if changed == 0 {
            return Err(DatabaseError::QueryFailed("no gym configured".into()));
        }
        Ok(())
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
