// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for kiosk-core operations.

use thiserror::Error;

/// All possible errors that can occur in kiosk-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("pending file not found: {0}")]
    FileNotFound(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: pending, syncing, synced, error")]
    InvalidSyncStatus(String),

    #[error("invalid sync transition: cannot go from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid connection state: '{0}'")]
    InvalidConnectionState(String),

    #[error("invalid status payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// Result type alias for kiosk-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
