// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! kiosk-agent: connection resilience and auto-sync for the kiosk dashboard.
//!
//! # Main Components
//!
//! - [`network::NetworkSignalObserver`] - passive OS-level link signals
//! - [`health::ConnectionHealthMonitor`] - active backend health probing and alerts
//! - [`channel::RealtimeStatusChannel`] - push channel with bounded reconnection
//! - [`status::StatusSourceArbitrator`] - one status feed from demo, push or poll
//! - [`sync::PendingSyncQueue`] and [`sync::AutoSyncScheduler`] - batched remote sync
//!
//! [`runtime::Agent`] wires them together for `kiosk-agent run`.

mod cli;
mod commands;

pub mod channel;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod network;
pub mod notify;
pub mod runtime;
pub mod status;
pub mod sync;

#[cfg(test)]
mod test_helpers;

pub use cli::{AutoSyncCommand, Cli, Command};
pub use config::{default_config_path, AgentConfig};
pub use error::{Error, Result};

use std::path::Path;
use std::sync::Arc;

use notify::TracingNotifier;

/// Execute a CLI command against the config at `config_path` (or the
/// default location).
pub fn run(command: Command, config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::load_or_default(&default_config_path())?,
    };

    match command {
        Command::Run => commands::block_on(runtime::run(config, Arc::new(TracingNotifier)))?,
        Command::Check => commands::check::run(&config),
        Command::Sync => commands::sync::run(&config),
        Command::ClearSynced => commands::sync::clear_synced(&config),
        Command::AutoSync(cmd) => commands::auto_sync::run(&config, cmd),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
