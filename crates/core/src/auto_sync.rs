// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable auto-sync settings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Shortest allowed auto-sync interval, in minutes.
pub const MIN_INTERVAL_MINUTES: u32 = 1;
/// Longest allowed auto-sync interval (one day), in minutes.
pub const MAX_INTERVAL_MINUTES: u32 = 1440;
/// Interval used when nothing has been persisted yet.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

/// Auto-sync configuration, loaded at start-up and saved on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
}

fn default_interval_minutes() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

impl Default for AutoSyncConfig {
    fn default() -> Self {
        AutoSyncConfig {
            enabled: false,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            last_sync_at: None,
        }
    }
}

/// Clamps a requested interval into `[MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES]`.
pub fn clamp_interval(minutes: i64) -> u32 {
    let clamped = minutes.clamp(MIN_INTERVAL_MINUTES as i64, MAX_INTERVAL_MINUTES as i64);
    clamped as u32
}

impl AutoSyncConfig {
    /// Returns a copy whose interval is within bounds. Applied after loading,
    /// since a hand-edited file may hold anything.
    pub fn normalized(mut self) -> Self {
        self.interval_minutes = clamp_interval(self.interval_minutes as i64);
        self
    }

    /// The configured interval as a duration.
    pub fn interval(&self) -> Duration {
        Duration::minutes(clamp_interval(self.interval_minutes as i64) as i64)
    }

    /// When the next sync is due: `last_sync_at + interval`, or
    /// `now + interval` if nothing was ever synced.
    pub fn next_sync_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_sync_at.unwrap_or(now) + self.interval()
    }
}

#[cfg(test)]
#[path = "auto_sync_tests.rs"]
mod tests;
