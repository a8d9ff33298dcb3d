// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! kiosk-core: Shared data model for the kiosk link agent
//!
//! This crate provides the connection, status and pending-sync types, the
//! pure state transitions over them, and the SQLite store for pending files.

pub mod auto_sync;
pub mod clock;
pub mod connection;
pub mod db;
pub mod error;
pub mod pending;
pub mod status;

pub use auto_sync::{clamp_interval, AutoSyncConfig, MAX_INTERVAL_MINUTES, MIN_INTERVAL_MINUTES};
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{ConnectionAlert, ConnectionState, HealthSnapshot, ProbeOutcome};
pub use db::Database;
pub use error::{Error, Result};
pub use pending::{PendingSyncFile, SyncFileStatus};
pub use status::{StatusSnapshot, StatusSource, StatusView, UiState};
