// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed storage for pending sync records.
//!
//! The [`Database`] struct is the durable half of the pending-file store; the
//! agent crate wraps it with a change feed.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::{Error, Result};
use crate::pending::{PendingSyncFile, SyncFileStatus};

/// SQL schema for the pending-file database.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS pending_sync_files (
    id TEXT PRIMARY KEY,
    file_path TEXT NOT NULL,
    file_hash TEXT NOT NULL,
    category TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'pending',
    detected_at TEXT NOT NULL,
    synced_at TEXT,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_pending_status ON pending_sync_files(status);
CREATE INDEX IF NOT EXISTS idx_pending_order ON pending_sync_files(priority, detected_at);
"#;

const COLUMNS: &str =
    "id, file_path, file_hash, category, priority, status, detected_at, synced_at, error_message";

/// Fixed-width timestamp format so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

fn row_to_file(row: &Row<'_>) -> std::result::Result<PendingSyncFile, rusqlite::Error> {
    let status_str: String = row.get(5)?;
    let detected_str: String = row.get(6)?;
    let synced_str: Option<String> = row.get(7)?;

    Ok(PendingSyncFile {
        id: row.get(0)?,
        file_path: row.get(1)?,
        file_hash: row.get(2)?,
        category: row.get(3)?,
        priority: row.get(4)?,
        status: parse_db(&status_str, "status")?,
        detected_at: parse_timestamp(&detected_str, "detected_at")?,
        synced_at: synced_str
            .as_deref()
            .map(|s| parse_timestamp(s, "synced_at"))
            .transpose()?,
        error_message: row.get(8)?,
    })
}

/// Run schema creation and all migrations on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_error_message(conn)?;
    Ok(())
}

/// Migration: databases created by early change detectors lack `error_message`.
fn migrate_add_error_message(conn: &Connection) -> Result<()> {
    let has_column: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('pending_sync_files') WHERE name = 'error_message'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false);

    if !has_column {
        conn.execute("ALTER TABLE pending_sync_files ADD COLUMN error_message TEXT", [])?;
    }
    Ok(())
}

/// SQLite database connection with pending-file operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL so the change detector can write while we read
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Insert a newly detected file.
    pub fn insert_file(&self, file: &PendingSyncFile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO pending_sync_files (id, file_path, file_hash, category, priority,
             status, detected_at, synced_at, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                file.id,
                file.file_path,
                file.file_hash,
                file.category,
                file.priority,
                file.status.as_str(),
                format_timestamp(&file.detected_at),
                file.synced_at.as_ref().map(format_timestamp),
                file.error_message,
            ],
        )?;
        Ok(())
    }

    /// Get a file record by ID.
    pub fn get_file(&self, id: &str) -> Result<PendingSyncFile> {
        let sql = format!("SELECT {COLUMNS} FROM pending_sync_files WHERE id = ?1");
        let file = self.conn.query_row(&sql, params![id], row_to_file).optional()?;
        file.ok_or_else(|| Error::FileNotFound(id.to_string()))
    }

    /// List records in any of `statuses`, in queue order.
    pub fn list_by_status(&self, statuses: &[SyncFileStatus]) -> Result<Vec<PendingSyncFile>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT {COLUMNS} FROM pending_sync_files
             WHERE status IN ({placeholders})
             ORDER BY priority ASC, detected_at ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let files = stmt
            .query_map(params_from_iter(statuses.iter().map(|s| s.as_str())), row_to_file)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    /// Move a set of records to `status` in one transaction.
    ///
    /// Rejects the whole update if any record would move backwards. IDs with no
    /// row are skipped, so a record deleted while its batch was in flight does
    /// not hold back the rest. `synced_at` and `error_message` are written as
    /// given, so moving to `syncing` clears a previous error message.
    pub fn set_status(
        &mut self,
        ids: &[String],
        status: SyncFileStatus,
        synced_at: Option<DateTime<Utc>>,
        error_message: Option<&str>,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut updated = 0;

        for id in ids {
            let current: Option<String> = tx
                .query_row(
                    "SELECT status FROM pending_sync_files WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let current: SyncFileStatus = match current {
                Some(s) => s.parse()?,
                None => continue,
            };
            if !current.can_transition_to(status) {
                return Err(Error::InvalidTransition {
                    from: current.to_string(),
                    to: status.to_string(),
                });
            }

            updated += tx.execute(
                "UPDATE pending_sync_files
                 SET status = ?1, synced_at = ?2, error_message = ?3
                 WHERE id = ?4",
                params![
                    status.as_str(),
                    synced_at.as_ref().map(format_timestamp),
                    error_message,
                    id
                ],
            )?;
        }

        tx.commit()?;
        Ok(updated)
    }

    /// Delete every record whose status is `synced`. Returns the deleted IDs.
    pub fn purge_synced(&mut self) -> Result<Vec<String>> {
        let tx = self.conn.transaction()?;
        let ids = {
            let mut stmt = tx.prepare("SELECT id FROM pending_sync_files WHERE status = 'synced'")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ids
        };
        tx.execute("DELETE FROM pending_sync_files WHERE status = 'synced'", [])?;
        tx.commit()?;
        Ok(ids)
    }

    /// Delete one record.
    pub fn delete_file(&self, id: &str) -> Result<()> {
        let affected = self
            .conn
            .execute("DELETE FROM pending_sync_files WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Error::FileNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Count records with the given status.
    pub fn count_by_status(&self, status: SyncFileStatus) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pending_sync_files WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
