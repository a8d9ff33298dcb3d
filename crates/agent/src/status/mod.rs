// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Unified status feed.
//!
//! Demo data wins outright. Otherwise a connected push channel with a
//! snapshot wins, and the periodic pull covers every other case. The pull
//! only runs while the push channel is not delivering.

mod arbitrator;
mod fetcher;
mod poller;

pub use arbitrator::{select, websocket_active, ArbitratorConfig, StatusSourceArbitrator};
pub use fetcher::{HttpStatusFetcher, StatusFetcher};
pub use poller::{
    poll_retry_delay, PollOutcome, PollState, StatusPoller, MAX_POLL_RETRIES, MAX_POLL_RETRY_DELAY,
};



#[cfg(test)]
mod poller_tests;
