// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `kiosk-agent auto-sync ...`: change and inspect the persisted schedule.
//!
//! Changes land in the settings file right away; a running agent picks them
//! up on its next start.

use std::sync::Arc;

use kiosk_core::SystemClock;

use crate::cli::AutoSyncCommand;
use crate::config::AgentConfig;
use crate::error::Result;
use crate::notify::TracingNotifier;
use crate::runtime::build_sync;
use crate::sync::AutoSyncScheduler;

pub fn run(config: &AgentConfig, command: AutoSyncCommand) -> Result<()> {
    let (_, scheduler) = build_sync(config, Arc::new(TracingNotifier), Arc::new(SystemClock))?;
    println!("{}", apply(&scheduler, command));
    Ok(())
}

/// Applies `command` and returns what to print.
pub fn apply(scheduler: &AutoSyncScheduler, command: AutoSyncCommand) -> String {
    match command {
        AutoSyncCommand::Enable => {
            scheduler.enable();
            "Auto-sync enabled".to_string()
        }
        AutoSyncCommand::Disable => {
            scheduler.disable();
            "Auto-sync disabled".to_string()
        }
        AutoSyncCommand::Toggle => {
            if scheduler.toggle() {
                "Auto-sync enabled".to_string()
            } else {
                "Auto-sync disabled".to_string()
            }
        }
        AutoSyncCommand::Interval { minutes } => {
            let stored = scheduler.set_sync_interval(minutes);
            format!("Auto-sync interval set to {} minute(s)", stored)
        }
        AutoSyncCommand::Status => status(scheduler),
    }
}

fn status(scheduler: &AutoSyncScheduler) -> String {
    let config = scheduler.config();
    let last = config
        .last_sync_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let next = match scheduler.time_until_next_sync() {
        Some(secs) => format!("in {}s", secs),
        None => "-".to_string(),
    };
    format!(
        "Auto-sync: {}\nInterval: {} minute(s)\nLast sync: {}\nNext sync: {}",
        if config.enabled { "enabled" } else { "disabled" },
        config.interval_minutes,
        last,
        next
    )
}

#[cfg(test)]
#[path = "auto_sync_tests.rs"]
mod tests;
