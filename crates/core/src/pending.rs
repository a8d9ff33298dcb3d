// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locally detected file changes awaiting remote synchronization.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sync progress of a single file record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFileStatus {
    /// Detected, not yet submitted.
    Pending,
    /// Part of the batch currently in flight.
    Syncing,
    /// Accepted by the remote repository.
    Synced,
    /// The batch it belonged to was rejected.
    Error,
}

impl SyncFileStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncFileStatus::Pending => "pending",
            SyncFileStatus::Syncing => "syncing",
            SyncFileStatus::Synced => "synced",
            SyncFileStatus::Error => "error",
        }
    }

    /// Check if a transition from this status to target is allowed.
    ///
    /// Status only moves forward: `pending → syncing → synced | error`. A
    /// failed file re-enters `syncing` when the next full batch picks it up.
    pub fn can_transition_to(&self, target: SyncFileStatus) -> bool {
        matches!(
            (self, target),
            (SyncFileStatus::Pending, SyncFileStatus::Syncing)
                | (SyncFileStatus::Error, SyncFileStatus::Syncing)
                | (SyncFileStatus::Syncing, SyncFileStatus::Synced)
                | (SyncFileStatus::Syncing, SyncFileStatus::Error)
        )
    }

    /// Returns true if the file still needs to reach the remote.
    pub fn awaits_sync(&self) -> bool {
        matches!(self, SyncFileStatus::Pending | SyncFileStatus::Error)
    }
}

impl fmt::Display for SyncFileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncFileStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(SyncFileStatus::Pending),
            "syncing" => Ok(SyncFileStatus::Syncing),
            "synced" => Ok(SyncFileStatus::Synced),
            "error" => Ok(SyncFileStatus::Error),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// A file change detected by the change detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSyncFile {
    pub id: String,
    pub file_path: String,
    pub file_hash: String,
    pub category: String,
    /// Lower is more urgent.
    pub priority: i64,
    pub status: SyncFileStatus,
    pub detected_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PendingSyncFile {
    /// Creates a freshly detected record in `pending` state.
    pub fn new(
        id: impl Into<String>,
        file_path: impl Into<String>,
        file_hash: impl Into<String>,
        category: impl Into<String>,
        priority: i64,
        detected_at: DateTime<Utc>,
    ) -> Self {
        PendingSyncFile {
            id: id.into(),
            file_path: file_path.into(),
            file_hash: file_hash.into(),
            category: category.into(),
            priority,
            status: SyncFileStatus::Pending,
            detected_at,
            synced_at: None,
            error_message: None,
        }
    }

    /// Queue processing order: priority ascending, then detection time.
    pub fn queue_order(a: &PendingSyncFile, b: &PendingSyncFile) -> Ordering {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.detected_at.cmp(&b.detected_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
