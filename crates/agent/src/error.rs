// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::channel::TransportError;
use crate::config::ConfigError;
use crate::http::ProbeError;
use crate::sync::{PushError, StoreError};

/// Errors surfaced by the agent's commands.
///
/// Component errors convert with `?`; the few agent-level variants carry a
/// hint for the operator.
#[derive(Debug, Error)]
pub enum Error {
    #[error("backend unreachable at {url}: {reason}\n  hint: check `api_base` in the config file and that the backend is running")]
    BackendUnreachable { url: String, reason: String },

    #[error("sync of {files} file(s) failed: {message}")]
    SyncFailed { files: usize, message: String },

    #[error("a sync is already in progress")]
    SyncInProgress,

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("channel error: {0}")]
    Transport(#[from] TransportError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Push(#[from] PushError),

    #[error(transparent)]
    Core(#[from] kiosk_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for agent operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
