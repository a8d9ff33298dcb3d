// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kiosk-agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Connection resilience and auto-sync agent for the kiosk dashboard")]
#[command(
    long_about = "Connection resilience and auto-sync agent for the kiosk dashboard.\n\n\
    Watches the backend link, keeps one status feed alive over the push channel or polling, \
    and pushes locally detected file changes to the remote repository on a schedule."
)]
pub struct Cli {
    /// Path of the agent config file
    #[arg(short = 'c', long = "config", global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Write logs to <path> instead of stderr
    #[arg(long = "log-file", global = true, value_name = "path")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start every component and run until Ctrl-C
    Run,

    /// Probe the backend once and print the link classification
    Check,

    /// Push every queued file now
    Sync,

    /// Delete records of files that already reached the remote
    #[command(name = "clear-synced")]
    ClearSynced,

    /// Inspect or change the auto-sync schedule
    #[command(name = "auto-sync", subcommand)]
    AutoSync(AutoSyncCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum AutoSyncCommand {
    /// Turn the timer on
    Enable,
    /// Turn the timer off
    Disable,
    /// Flip the timer on or off
    Toggle,
    /// Set the interval; clamped to 1..=1440
    Interval {
        /// Minutes between syncs
        #[arg(allow_negative_numbers = true)]
        minutes: i64,
    },
    /// Print the current schedule
    Status,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
