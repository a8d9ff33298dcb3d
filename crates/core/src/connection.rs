// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Backend link classification.
//!
//! [`HealthSnapshot::apply`] is the whole health state machine: the monitor
//! feeds it one [`ProbeOutcome`] per probe and forwards the returned alert.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Authoritative classification of the backend link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No probe has completed yet.
    #[default]
    Checking,
    /// The last probe succeeded.
    Online,
    /// The link was just lost.
    Offline,
    /// Still failing after the link was lost.
    Reconnecting,
}

impl ConnectionState {
    /// Returns the string representation used in logs and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Checking => "checking",
            ConnectionState::Online => "online",
            ConnectionState::Offline => "offline",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    /// True for the states the user sees as "no connection".
    pub fn is_down(&self) -> bool {
        matches!(self, ConnectionState::Offline | ConnectionState::Reconnecting)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConnectionState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(ConnectionState::Checking),
            "online" => Ok(ConnectionState::Online),
            "offline" => Ok(ConnectionState::Offline),
            "reconnecting" => Ok(ConnectionState::Reconnecting),
            _ => Err(Error::InvalidConnectionState(s.to_string())),
        }
    }
}

/// Result of one reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure,
}

/// One-shot user-facing notification emitted on a link transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionAlert {
    /// The backend stopped answering.
    Lost,
    /// The backend answers again after an outage.
    Restored,
}

impl ConnectionAlert {
    /// Human-readable alert text.
    pub fn message(&self) -> &'static str {
        match self {
            ConnectionAlert::Lost => "Connection to the server was lost",
            ConnectionAlert::Restored => "Connection to the server restored",
        }
    }
}

/// Current view of the backend link, mutated only by the probe cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HealthSnapshot {
    pub state: ConnectionState,
    pub last_check_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

impl HealthSnapshot {
    /// Snapshot used while demo mode pins the link up.
    pub fn pinned_online() -> Self {
        HealthSnapshot { state: ConnectionState::Online, last_check_at: None, consecutive_failures: 0 }
    }

    /// Applies a probe result and returns the alert to fire, if any.
    ///
    /// Failures increment the counter and successes reset it. An alert fires
    /// only on the `online → offline` edge and the `offline → online` edge, so
    /// a run of failures produces a single "lost" alert.
    pub fn apply(&mut self, outcome: ProbeOutcome, at: DateTime<Utc>) -> Option<ConnectionAlert> {
        self.last_check_at = Some(at);
        let previous = self.state;

        match outcome {
            ProbeOutcome::Success => {
                self.consecutive_failures = 0;
                self.state = ConnectionState::Online;
                previous.is_down().then_some(ConnectionAlert::Restored)
            }
            ProbeOutcome::Failure => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                match previous {
                    ConnectionState::Online => {
                        self.state = ConnectionState::Offline;
                        Some(ConnectionAlert::Lost)
                    }
                    ConnectionState::Offline | ConnectionState::Reconnecting => {
                        self.state = ConnectionState::Reconnecting;
                        None
                    }
                    ConnectionState::Checking => {
                        self.state = ConnectionState::Offline;
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
