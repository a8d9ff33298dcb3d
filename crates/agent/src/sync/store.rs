// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-file storage with a change feed.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use kiosk_core::{Database, PendingSyncFile, SyncFileStatus};
use tokio::sync::broadcast;

/// Capacity of the change feed. A lagging subscriber just re-fetches.
const CHANGE_FEED_CAPACITY: usize = 64;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] kiosk_core::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// One mutation of the backing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Inserted(String),
    Updated(Vec<String>),
    Deleted(Vec<String>),
}

/// Record store for pending files.
///
/// Every successful mutation is announced on [`subscribe`](Self::subscribe).
pub trait PendingFileStore: Send + Sync {
    fn insert(&self, file: &PendingSyncFile) -> StoreResult<()>;

    /// Records in any of `statuses`, priority first, then detection time.
    fn list(&self, statuses: &[SyncFileStatus]) -> StoreResult<Vec<PendingSyncFile>>;

    /// Moves every record in `ids` to `status`, or none of them. IDs with no
    /// record are skipped.
    fn set_status(
        &self,
        ids: &[String],
        status: SyncFileStatus,
        synced_at: Option<DateTime<Utc>>,
        error_message: Option<&str>,
    ) -> StoreResult<usize>;

    /// Deletes all `synced` records and returns their IDs.
    fn purge_synced(&self) -> StoreResult<Vec<String>>;

    fn delete(&self, id: &str) -> StoreResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// SQLite-backed store.
pub struct SqliteFileStore {
    db: Mutex<Database>,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteFileStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        Ok(Self::from_database(Database::open(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        SqliteFileStore { db: Mutex::new(db), changes }
    }

    /// Count of records in `status`.
    pub fn count(&self, status: SyncFileStatus) -> StoreResult<usize> {
        Ok(self.db().count_by_status(status)?)
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        match self.db.lock() {
            Ok(db) => db,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn announce(&self, change: StoreChange) {
        // No subscribers is fine
        let _ = self.changes.send(change);
    }
}

impl PendingFileStore for SqliteFileStore {
    fn insert(&self, file: &PendingSyncFile) -> StoreResult<()> {
        self.db().insert_file(file)?;
        self.announce(StoreChange::Inserted(file.id.clone()));
        Ok(())
    }

    fn list(&self, statuses: &[SyncFileStatus]) -> StoreResult<Vec<PendingSyncFile>> {
        Ok(self.db().list_by_status(statuses)?)
    }

    fn set_status(
        &self,
        ids: &[String],
        status: SyncFileStatus,
        synced_at: Option<DateTime<Utc>>,
        error_message: Option<&str>,
    ) -> StoreResult<usize> {
        let updated = self.db().set_status(ids, status, synced_at, error_message)?;
        if updated > 0 {
            self.announce(StoreChange::Updated(ids.to_vec()));
        }
        Ok(updated)
    }

    fn purge_synced(&self) -> StoreResult<Vec<String>> {
        let ids = self.db().purge_synced()?;
        if !ids.is_empty() {
            self.announce(StoreChange::Deleted(ids.clone()));
        }
        Ok(ids)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        self.db().delete_file(id)?;
        self.announce(StoreChange::Deleted(vec![id.to_string()]));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}
