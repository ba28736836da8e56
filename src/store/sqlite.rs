//! SQLite-backed store.
//!
//! Holds only the database path. Every operation opens its own connection
//! and drops it before returning, so no connection outlives a call.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::{CategoryRecord, CategoryRegistry, ParameterStore, StoreError};
use crate::config::Parameters;

const AREAS_TABLE: &str = "areas";
const PARAMETERS_TABLE: &str = "parameters";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open the database at `path`, creating it if needed.
    ///
    /// When neither table exists yet, both are created and the default
    /// parameters are seeded. An existing store is left untouched.
    pub fn bootstrap(path: &Path) -> Result<Self, StoreError> {
        Self::bootstrap_with(path, &Parameters::seed_defaults())
    }

    /// Like [`SqliteStore::bootstrap`], seeding `seed` instead of the defaults.
    pub fn bootstrap_with(path: &Path, seed: &Parameters) -> Result<Self, StoreError> {
        let store = Self {
            path: path.to_path_buf(),
        };
        store.with_conn_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            |conn| {
                let existing = existing_tables(conn)?;
                if existing.is_empty() {
                    create_schema(conn, seed)?;
                    tracing::info!(path = %path.display(), ?seed, "created decision store");
                } else if existing.len() == 1 {
                    tracing::warn!(path = %path.display(), tables = ?existing, "decision store is only partially initialized");
                } else {
                    tracing::debug!(path = %path.display(), tables = ?existing, "decision store already initialized");
                }
                Ok(())
            },
        )?;
        Ok(store)
    }

    /// Open an existing store without creating or seeding anything.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = Self {
            path: path.to_path_buf(),
        };
        store.with_conn(|conn| {
            let existing = existing_tables(conn)?;
            if existing.len() != 2 {
                return Err(StoreError::Unavailable(format!(
                    "{} is not an initialized decision store",
                    path.display()
                )));
            }
            Ok(())
        })?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or overwrite a parameter.
    pub fn set_parameter(&self, name: &str, value: f64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO parameters (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = excluded.value",
                params![name, value],
            )?;
            Ok(())
        })
    }

    /// All registered categories in registration order.
    pub fn categories(&self) -> Result<Vec<CategoryRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT name, times_chosen, registered_at FROM areas ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut records = Vec::new();
            for row in rows {
                let (name, times_chosen, registered_at) = row?;
                records.push(CategoryRecord {
                    name,
                    usage_count: to_count(times_chosen)?,
                    registered_at: parse_timestamp(&registered_at)?,
                });
            }
            Ok(records)
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.with_conn_flags(OpenFlags::SQLITE_OPEN_READ_WRITE, f)
    }

    // The connection is dropped when this returns, whichever way f exits.
    fn with_conn_flags<T>(
        &self,
        flags: OpenFlags,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = Connection::open_with_flags(&self.path, flags | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(|e| {
                StoreError::Unavailable(format!("cannot open {}: {e}", self.path.display()))
            })?;
        f(&conn)
    }
}

impl ParameterStore for SqliteStore {
    fn get(&self, name: &str) -> Result<f64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM parameters WHERE name = ?1",
                params![name],
                |row| row.get::<_, f64>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::ParameterNotFound(name.to_string()))
        })
    }
}

impl CategoryRegistry for SqliteStore {
    fn list_all(&self) -> Result<BTreeSet<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM areas")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok(names)
        })
    }

    fn register(&self, name: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO areas (name, times_chosen, registered_at) VALUES (?1, 0, ?2)",
                params![name, Utc::now().to_rfc3339()],
            )?;
            Ok(inserted == 1)
        })
    }

    fn usage_count(&self, name: &str) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let times_chosen = conn
                .query_row(
                    "SELECT times_chosen FROM areas WHERE name = ?1",
                    params![name],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .ok_or_else(|| StoreError::CategoryNotFound(name.to_string()))?;
            to_count(times_chosen)
        })
    }

    fn set_usage_count(&self, name: &str, count: u64) -> Result<(), StoreError> {
        let count = i64::try_from(count)
            .map_err(|_| StoreError::Unavailable(format!("usage count {count} overflows storage")))?;
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE areas SET times_chosen = ?1 WHERE name = ?2",
                params![count, name],
            )?;
            if updated == 0 {
                return Err(StoreError::CategoryNotFound(name.to_string()));
            }
            Ok(())
        })
    }
}

fn existing_tables(conn: &Connection) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2) ORDER BY name",
    )?;
    let names = stmt
        .query_map(params![AREAS_TABLE, PARAMETERS_TABLE], |row| {
            row.get::<_, String>(0)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn create_schema(conn: &Connection, seed: &Parameters) -> Result<(), StoreError> {
    // Tables and seed rows land together or not at all
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS areas (
            id            INTEGER PRIMARY KEY,
            name          TEXT NOT NULL UNIQUE,
            times_chosen  INTEGER NOT NULL DEFAULT 0,
            registered_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS parameters (
            id    INTEGER PRIMARY KEY,
            name  TEXT NOT NULL UNIQUE,
            value REAL NOT NULL
        );
        ",
    )?;
    for (name, value) in seed.entries() {
        tx.execute(
            "INSERT OR IGNORE INTO parameters (name, value) VALUES (?1, ?2)",
            params![name, value],
        )?;
    }
    tx.commit()?;
    Ok(())
}

fn to_count(value: i64) -> Result<u64, StoreError> {
    u64::try_from(value)
        .map_err(|_| StoreError::Unavailable(format!("negative usage count {value} in store")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("bad registered_at {value:?}: {e}")))
}
