// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime status channel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐ commands ┌──────────┐  frames  ┌───────────┐
//! │ RealtimeStatusChannel│─────────►│  Driver  │◄─────────│ Transport │
//! │       (handle)       │◄─────────│  (task)  │─────────►│  (trait)  │
//! └──────────────────────┘  watch   └──────────┘ open/close└───────────┘
//!                                        │
//!                                        ▼
//!                                 fsm::transition
//! ```
//!
//! The driver feeds every socket event through the pure [`fsm::transition`]
//! and executes the returned [`Effect`].

mod fsm;
mod realtime;
mod transport;

pub use fsm::{
    retry_delay, transition, ChannelEvent, ChannelState, Effect, BASE_RETRY_DELAY,
    MAX_RECONNECT_ATTEMPTS,
};
pub use realtime::{ChannelStatus, RealtimeStatusChannel, CONNECT_TIMEOUT};
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};



#[cfg(test)]
mod transport_tests;
