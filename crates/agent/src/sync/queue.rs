// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Observed list of files awaiting sync.
//!
//! The queue holds every record still waiting to reach the remote: fresh
//! `pending` rows and `error` rows from a rejected batch. Any store change
//! triggers a full re-fetch; there is no incremental patching.

use std::sync::Arc;

use kiosk_core::{PendingSyncFile, SyncFileStatus};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::store::{PendingFileStore, StoreChange, StoreResult};

/// Statuses the queue shows.
pub const QUEUED_STATUSES: [SyncFileStatus; 2] = [SyncFileStatus::Pending, SyncFileStatus::Error];

/// Error message left on rows whose batch never finished.
pub const INTERRUPTED_MESSAGE: &str = "sync interrupted before completion";

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct PendingSyncQueue {
    store: Arc<dyn PendingFileStore>,
    files: Arc<watch::Sender<Vec<PendingSyncFile>>>,
    cancel: CancellationToken,
}

impl PendingSyncQueue {
    /// Loads the current rows, first returning any batch left `syncing` by an
    /// earlier run to `error` so the next tick retries it.
    pub fn new(store: Arc<dyn PendingFileStore>) -> StoreResult<Self> {
        let (files, _) = watch::channel(Vec::new());
        let queue = PendingSyncQueue {
            store,
            files: Arc::new(files),
            cancel: CancellationToken::new(),
        };
        queue.recover_interrupted()?;
        queue.refresh()?;
        Ok(queue)
    }

    /// Moves every `syncing` row to `error`. Returns how many moved.
    pub fn recover_interrupted(&self) -> StoreResult<usize> {
        let stranded: Vec<String> = self
            .store
            .list(&[SyncFileStatus::Syncing])?
            .into_iter()
            .map(|f| f.id)
            .collect();
        if stranded.is_empty() {
            return Ok(0);
        }
        let moved = self.store.set_status(
            &stranded,
            SyncFileStatus::Error,
            None,
            Some(INTERRUPTED_MESSAGE),
        )?;
        tracing::warn!("recovered {} file(s) from an interrupted sync", moved);
        Ok(moved)
    }

    /// Re-reads the queued rows from the store and publishes them.
    pub fn refresh(&self) -> StoreResult<Vec<PendingSyncFile>> {
        let mut files = self.store.list(&QUEUED_STATUSES)?;
        files.sort_by(PendingSyncFile::queue_order);
        self.files.send_if_modified(|current| {
            let changed = *current != files;
            if changed {
                current.clone_from(&files);
            }
            changed
        });
        Ok(files)
    }

    pub fn store(&self) -> &Arc<dyn PendingFileStore> {
        &self.store
    }

    /// Last published contents, in queue order.
    pub fn files(&self) -> Vec<PendingSyncFile> {
        self.files.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<PendingSyncFile>> {
        self.files.subscribe()
    }

    /// Follows the store's change feed until [`shutdown`](Self::shutdown).
    pub fn start(&self) -> JoinHandle<()> {
        let queue = self.clone();
        let changes = self.store.subscribe();
        tokio::spawn(async move { queue.follow(changes).await })
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn follow(&self, mut changes: broadcast::Receiver<StoreChange>) {
        loop {
            let change = tokio::select! {
                _ = self.cancel.cancelled() => break,
                change = changes.recv() => change,
            };
            match change {
                Ok(change) => tracing::trace!("store change: {:?}", change),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!("queue missed {} store changes", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            if let Err(e) = self.refresh() {
                tracing::warn!("failed to refresh sync queue: {}", e);
            }
        }
        tracing::debug!("sync queue stopped following store");
    }
}
