//! SQLite-backed storage for accounts, projects, assignments, tasks, timeline
//! events, inquiries and notifications.
//!
//! The database lives at `~/.backoffice/backoffice.db` unless the config names
//! another path. Uniqueness invariants (account email, one assignment per
//! project/member pair) are schema constraints, so concurrent writers cannot
//! race past a pre-check.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::roles::Role;
use crate::types::*;

pub mod types;
pub use types::*;

pub struct BackofficeDb {
    conn: Connection,
}

impl BackofficeDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a write transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| E::from(DbError::from(e)))?;
        match f(self) {
            Ok(val) => {
                if let Err(e) = self.conn.execute_batch("COMMIT") {
                    self.end_transaction("ROLLBACK");
                    return Err(E::from(DbError::from(e)));
                }
                Ok(val)
            }
            Err(e) => {
                self.end_transaction("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Execute a closure within a read transaction so every query in it sees
    /// the same snapshot.
    pub fn with_snapshot<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN DEFERRED")
            .map_err(|e| E::from(DbError::from(e)))?;
        let result = f(self);
        // Nothing was written, so ending the transaction either way is a release.
        self.end_transaction(if result.is_ok() { "COMMIT" } else { "ROLLBACK" });
        result
    }

    /// Run a closing COMMIT/ROLLBACK whose failure the caller cannot act on.
    /// Returns whether it succeeded.
    fn end_transaction(&self, statement: &str) -> bool {
        match self.conn.execute_batch(statement) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to {statement} transaction: {e}");
                false
            }
        }
    }

    /// Open (or create) the database at the default path and apply the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL keeps readers off the writer's lock
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        log::debug!("Opened backoffice database at {}", path.display());
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.backoffice/backoffice.db`.
    pub fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".backoffice").join("backoffice.db"))
    }
}

// -----------------------------------------------------------------------------
// Row helpers shared by the table modules
// -----------------------------------------------------------------------------

/// Read an optional joined account (id, full_name, email, role) starting at
/// column `start`. `fk_idx` is the column holding the foreign key itself; a
/// set key whose join found nothing is a dangling reference.
pub(crate) fn staff_at(
    row: &rusqlite::Row<'_>,
    fk_idx: usize,
    start: usize,
    relation: &str,
) -> rusqlite::Result<Option<StaffSummary>> {
    let fk: Option<i64> = row.get(fk_idx)?;
    let joined: Option<i64> = row.get(start)?;
    match (fk, joined) {
        (None, _) => Ok(None),
        (Some(fk), None) => Err(dangling(
            start,
            format!("{relation} references missing account {fk}"),
        )),
        (Some(_), Some(id)) => Ok(Some(StaffSummary {
            id,
            full_name: row.get(start + 1)?,
            email: row.get(start + 2)?,
            role: row.get::<_, Role>(start + 3)?,
        })),
    }
}

pub mod accounts;
pub mod assignments;
pub mod inquiries;
pub mod notifications;
pub mod projects;
pub mod tasks;
pub mod timeline;

// =============================================================================
// Shared test utilities
// =============================================================================


// =============================================================================
// Tests
// =============================================================================
