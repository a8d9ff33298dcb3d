// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel lifecycle as a pure state machine.
//!
//! ```text
//!   Idle ──Connect──► Connecting ──Opened──► Connected
//!                        ▲   │                  │
//!                RetryDue│   │Lost              │Lost
//!                        │   ▼                  │
//!                   Reconnecting{n} ◄───────────┘
//!                        │
//!                        │ Lost after the last retry
//!                        ▼
//!                      Failed ──Reconnect──► Connecting
//! ```
//!
//! `Disconnect` moves any state to `Closed` without scheduling a retry.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Retries attempted after a drop before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Delay before the first retry; doubles for each later one.
pub const BASE_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Where the push channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ChannelState {
    /// Never asked to connect.
    #[default]
    Idle,
    /// Opening the socket. `attempt` retries have been spent so far.
    Connecting { attempt: u32 },
    Connected,
    /// Waiting to make retry number `attempt`.
    Reconnecting { attempt: u32 },
    /// Retries exhausted. Only an explicit reconnect leaves this state.
    Failed,
    /// Torn down on purpose.
    Closed,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Idle => "idle",
            ChannelState::Connecting { .. } => "connecting",
            ChannelState::Connected => "connected",
            ChannelState::Reconnecting { .. } => "reconnecting",
            ChannelState::Failed => "failed",
            ChannelState::Closed => "closed",
        }
    }

    /// Retries spent since the last successful open.
    pub fn attempt(&self) -> u32 {
        match self {
            ChannelState::Connecting { attempt } | ChannelState::Reconnecting { attempt } => {
                *attempt
            }
            ChannelState::Failed => MAX_RECONNECT_ATTEMPTS,
            _ => 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected)
    }

    /// The channel dropped and has not recovered. A retry's open attempt
    /// still counts.
    pub fn is_erroring(&self) -> bool {
        match self {
            ChannelState::Connecting { attempt } => *attempt > 0,
            ChannelState::Reconnecting { .. } | ChannelState::Failed => true,
            _ => false,
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Connecting { attempt } | ChannelState::Reconnecting { attempt }
                if *attempt > 0 =>
            {
                write!(f, "{} (attempt {})", self.as_str(), attempt)
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Inputs to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Caller asked for a connection.
    Connect,
    /// The transport finished opening.
    Opened,
    /// The transport closed or errored, or an open attempt failed.
    Lost,
    /// The retry timer fired.
    RetryDue,
    /// Caller asked to start over with a fresh attempt counter.
    Reconnect,
    /// Caller is tearing the channel down.
    Disconnect,
}

/// What the driver must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Nothing,
    /// Cancel any pending retry and open the transport.
    Open,
    /// Arm the single retry timer.
    ScheduleRetry(Duration),
    /// Cancel any pending retry and close the transport.
    Close,
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, 8s, 16s.
pub fn retry_delay(attempt: u32) -> Duration {
    BASE_RETRY_DELAY.saturating_mul(1 << attempt.saturating_sub(1).min(16))
}

/// The transition function.
pub fn transition(state: ChannelState, event: ChannelEvent) -> (ChannelState, Effect) {
    use ChannelEvent as E;
    use ChannelState as S;

    match (state, event) {
        (_, E::Disconnect) => (S::Closed, Effect::Close),
        (_, E::Reconnect) => (S::Connecting { attempt: 0 }, Effect::Open),

        (S::Idle | S::Closed, E::Connect) => (S::Connecting { attempt: 0 }, Effect::Open),
        (_, E::Connect) => (state, Effect::Nothing),

        (S::Connecting { .. }, E::Opened) => (S::Connected, Effect::Nothing),
        // A socket opened after we stopped wanting it
        (_, E::Opened) => (state, Effect::Close),

        (S::Connected, E::Lost) => schedule_retry(0),
        (S::Connecting { attempt }, E::Lost) => schedule_retry(attempt),
        (_, E::Lost) => (state, Effect::Nothing),

        (S::Reconnecting { attempt }, E::RetryDue) => (S::Connecting { attempt }, Effect::Open),
        (_, E::RetryDue) => (state, Effect::Nothing),
    }
}

fn schedule_retry(spent: u32) -> (ChannelState, Effect) {
    if spent >= MAX_RECONNECT_ATTEMPTS {
        return (ChannelState::Failed, Effect::Nothing);
    }
    let attempt = spent + 1;
    (ChannelState::Reconnecting { attempt }, Effect::ScheduleRetry(retry_delay(attempt)))
}
