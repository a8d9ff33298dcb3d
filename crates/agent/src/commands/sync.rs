// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `kiosk-agent sync` and `kiosk-agent clear-synced`.

use std::sync::Arc;

use kiosk_core::SystemClock;

use super::block_on;
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::notify::TracingNotifier;
use crate::runtime::build_sync;
use crate::sync::SyncOutcome;

/// One line for the operator.
pub fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::NothingToSync => "No files to sync".to_string(),
        SyncOutcome::AlreadySyncing => "A sync is already in progress".to_string(),
        SyncOutcome::Synced { count } => format!("Synced {} file(s)", count),
        SyncOutcome::Failed { count, message } => {
            format!("Sync of {} file(s) failed: {}", count, message)
        }
    }
}

/// Pushes every queued file once. A failed batch is an error.
pub fn run(config: &AgentConfig) -> Result<()> {
    let outcome = block_on(async {
        let (_, scheduler) = build_sync(config, Arc::new(TracingNotifier), Arc::new(SystemClock))?;
        Ok::<_, Error>(scheduler.trigger_sync().await)
    })??;

    println!("{}", describe(&outcome));
    into_result(outcome)
}

pub(crate) fn into_result(outcome: SyncOutcome) -> Result<()> {
    match outcome {
        SyncOutcome::Failed { count, message } => Err(Error::SyncFailed { files: count, message }),
        SyncOutcome::AlreadySyncing => Err(Error::SyncInProgress),
        SyncOutcome::NothingToSync | SyncOutcome::Synced { .. } => Ok(()),
    }
}

/// Purges `synced` records.
pub fn clear_synced(config: &AgentConfig) -> Result<()> {
    let (_, scheduler) = build_sync(config, Arc::new(TracingNotifier), Arc::new(SystemClock))?;
    let purged = scheduler.clear_synced_files()?;
    println!("Cleared {} synced file record(s)", purged);
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
