// crates/flipgate-store-sqlite/src/session.rs
// ============================================================================
// Module: SQLite Session
// Description: Connection handle used by the feature store.
// Purpose: Execute single statements and stream rows from the engine.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! [`Session`] is the seam between the feature store and the storage engine:
//! it executes one statement per call and reports whether a table exists.
//! [`SqliteSession`] implements it over one `SQLite` connection whose access is
//! serialized per statement. No lock is held between two calls, so a sequence
//! of calls made by the store is never atomic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::ToSql;
use rusqlite::params;

use crate::codec::FeatureRecord;
use crate::codec::map_feature_row;
use crate::config::SqliteFeatureStoreConfig;
use crate::error::SqliteStoreError;

// ============================================================================
// SECTION: Session Contract
// ============================================================================

/// Visitor invoked once per scanned record.
pub type RecordVisitor<'a> = dyn FnMut(FeatureRecord) -> Result<(), SqliteStoreError> + 'a;

/// Statement execution handle for the feature store.
pub trait Session: Send + Sync {
    /// Returns true when a table named `table` exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the engine cannot be queried.
    fn table_exists(&self, table: &str) -> Result<bool, SqliteStoreError>;

    /// Executes one statement and returns the number of changed rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Conflict`] for constraint violations and
    /// [`SqliteStoreError::Db`] for other engine failures.
    fn execute(&self, statement: &str, params: &[&dyn ToSql]) -> Result<usize, SqliteStoreError>;

    /// Runs a row select and feeds each decoded record to `visit`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails, a row cannot be
    /// decoded, or `visit` fails.
    fn scan(
        &self,
        statement: &str,
        params: &[&dyn ToSql],
        visit: &mut RecordVisitor<'_>,
    ) -> Result<(), SqliteStoreError>;

    /// Runs a single-column text select.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Db`] when the query fails.
    fn query_strings(
        &self,
        statement: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<String>, SqliteStoreError>;

    /// Verifies the engine answers a trivial statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the engine is unavailable.
    fn ping(&self) -> Result<(), SqliteStoreError>;
}

// ============================================================================
// SECTION: SQLite Session
// ============================================================================

/// [`Session`] over a single `SQLite` connection.
///
/// # Invariants
/// - Connection access is serialized through a mutex held for one statement.
#[derive(Debug)]
pub struct SqliteSession {
    /// Shared connection guarded by a mutex.
    connection: Mutex<Connection>,
}

impl SqliteSession {
    /// Opens the database selected by `config` and applies its pragmas.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the config is invalid or the database
    /// cannot be opened.
    pub fn open(config: &SqliteFeatureStoreConfig) -> Result<Self, SqliteStoreError> {
        config.validate()?;
        let connection = if config.is_in_memory() {
            Connection::open_in_memory().map_err(|err| SqliteStoreError::from_db(&err))?
        } else {
            ensure_parent_dir(&config.path)?;
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
            Connection::open_with_flags(&config.path, flags)
                .map_err(|err| SqliteStoreError::from_db(&err))?
        };
        apply_pragmas(&connection, config)?;
        Ok(Self::from_connection(connection))
    }

    /// Wraps an already configured connection.
    #[must_use]
    pub const fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    /// Locks the connection for one statement.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }
}

impl Session for SqliteSession {
    fn table_exists(&self, table: &str) -> Result<bool, SqliteStoreError> {
        let names = self.query_strings(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
        )?;
        Ok(!names.is_empty())
    }

    fn execute(&self, statement: &str, params: &[&dyn ToSql]) -> Result<usize, SqliteStoreError> {
        let guard = self.lock()?;
        guard.execute(statement, params).map_err(|err| SqliteStoreError::from_db(&err))
    }

    fn scan(
        &self,
        statement: &str,
        params: &[&dyn ToSql],
        visit: &mut RecordVisitor<'_>,
    ) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard.prepare(statement).map_err(|err| SqliteStoreError::from_db(&err))?;
        let rows =
            stmt.query_map(params, map_feature_row).map_err(|err| SqliteStoreError::from_db(&err))?;
        for row in rows {
            let row = row.map_err(|err| SqliteStoreError::from_db(&err))?;
            visit(row.into_record()?)?;
        }
        Ok(())
    }

    fn query_strings(
        &self,
        statement: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<String>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut stmt = guard.prepare(statement).map_err(|err| SqliteStoreError::from_db(&err))?;
        let rows = stmt
            .query_map(params, |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::from_db(&err))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| SqliteStoreError::from_db(&err))
    }

    fn ping(&self) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|err| SqliteStoreError::from_db(&err))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the database file exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
        }
        _ => Ok(()),
    }
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteFeatureStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
