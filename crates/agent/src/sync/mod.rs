// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-file queue and auto-sync.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐ change feed ┌──────────────────┐
//! │    Store    │────────────►│ PendingSyncQueue │
//! │  (SQLite)   │◄──────┐     └────────┬─────────┘
//! └─────────────┘       │              │ refresh
//!                status │     ┌────────▼─────────┐     ┌─────────────┐
//!                       └─────│ AutoSyncScheduler│────►│ BatchPusher │
//!                             └────────┬─────────┘     └─────────────┘
//!                                      │ load/save
//!                             ┌────────▼─────────┐
//!                             │ ConfigRepository │
//!                             └──────────────────┘
//! ```

mod push;
mod queue;
mod scheduler;
mod settings;
mod store;

pub use push::{BatchPusher, HttpBatchPusher, PushError, PUSH_TIMEOUT};
pub use queue::{PendingSyncQueue, QUEUED_STATUSES};
pub use scheduler::{commit_message, AutoSyncScheduler, SyncOutcome};
pub use settings::{ConfigRepository, TomlConfigRepository};
pub use store::{PendingFileStore, SqliteFileStore, StoreChange, StoreError, StoreResult};
