//!
//! vendigo store module
//! --------------------
//! SQLite-backed relational store for the marketplace. One `Store` owns a
//! single `rusqlite::Connection`; the schema is applied idempotently on open
//! and foreign keys are always enforced. Per-table query functions live in
//! submodules and take `&Connection`, so composite operations can run several
//! statements under one lock of the shared handle.
//!
//! The public API centers around the `Store` type, which is usually wrapped in
//! a thread-safe `SharedStore` (`Arc<Mutex<Store>>`) elsewhere in the codebase.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::Connection;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

pub mod accounts;
pub mod catalog;
pub mod messages;
pub mod orders;
pub mod profiles;
pub mod schema;
pub mod tokens;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,
    #[error("row not found")]
    NotFound,
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(ffi_err, msg) => match ffi_err.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    // sqlite reports "UNIQUE constraint failed: <table.columns>";
                    // keep only the column list as the constraint label.
                    let constraint = msg
                        .as_deref()
                        .and_then(|m| m.rsplit_once(": ").map(|(_, tail)| tail.to_string()))
                        .unwrap_or_else(|| "unknown".to_string());
                    StoreError::UniqueViolation { constraint }
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::ForeignKeyViolation,
                _ => StoreError::Sqlite(e),
            },
            _ => StoreError::Sqlite(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Timestamps are stored and serialized as RFC 3339 UTC with microseconds.
pub fn now_stamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Read a TEXT column holding a canonical decimal rendering.
pub(crate) fn dec_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Read a nullable TEXT column holding a decimal rendering.
pub(crate) fn opt_dec_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(None),
        Some(t) => Decimal::from_str(&t).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

/// Owner of the SQLite connection. All query functions in the submodules take
/// the connection this hands out.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) a file-backed store and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::init(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(schema::SCHEMA_SQL)?;
        debug!(target: "vendigo::store", "schema applied");
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[derive(Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::open(path)?))))
    }

    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::open_in_memory()?))))
    }

    /// Run a closure against the connection under the store lock. Composite
    /// operations that must be race-safe (get-or-create, multi-statement
    /// writes) go through a single `with` call.
    pub fn with<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.0.lock();
        f(guard.conn())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
