// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic status pull with bounded retries and a freshness-aware cache.

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::{StatusSnapshot, StatusSource, StatusView, UiState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::fetcher::StatusFetcher;
use crate::http::ProbeError;

/// Retries after the first failed pull of a round.
pub const MAX_POLL_RETRIES: u32 = 3;

/// Ceiling for the delay between retries.
pub const MAX_POLL_RETRY_DELAY: Duration = Duration::from_millis(8_000);

/// Delay before retry `n + 1` of a round: 1s, 2s, 4s, capped at 8s.
pub fn poll_retry_delay(n: u32) -> Duration {
    std::cmp::min(
        Duration::from_millis(1_000).saturating_mul(1 << n.min(16)),
        MAX_POLL_RETRY_DELAY,
    )
}

/// How the last finished round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Fresh,
    Empty,
    /// Every retry failed; carries the last error.
    Exhausted(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Cached {
    snapshot: StatusSnapshot,
    fetched_at: Instant,
}

/// Everything the poller has learned so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    cached: Option<Cached>,
    outcome: Option<PollOutcome>,
}

impl PollState {
    pub fn record(&mut self, snapshot: Option<StatusSnapshot>, at: Instant) {
        match snapshot {
            Some(snapshot) => {
                self.cached = Some(Cached { snapshot, fetched_at: at });
                self.outcome = Some(PollOutcome::Fresh);
            }
            None => {
                self.cached = None;
                self.outcome = Some(PollOutcome::Empty);
            }
        }
    }

    pub fn record_exhausted(&mut self, message: impl Into<String>) {
        self.outcome = Some(PollOutcome::Exhausted(message.into()));
    }

    pub fn outcome(&self) -> Option<&PollOutcome> {
        self.outcome.as_ref()
    }

    /// The cached snapshot and whether it is stale, unless it has expired.
    ///
    /// Stale past half the interval, expired past twice the interval.
    pub fn cached(&self, now: Instant, interval: Duration) -> Option<(&StatusSnapshot, bool)> {
        let cached = self.cached.as_ref()?;
        let age = now.saturating_duration_since(cached.fetched_at);
        if age > interval.saturating_mul(2) {
            return None;
        }
        Some((&cached.snapshot, age > interval / 2))
    }

    /// Renders the pull side as a view tagged with `source`.
    pub fn view(&self, source: StatusSource, now: Instant, interval: Duration) -> StatusView {
        let cached = self.cached(now, interval);
        let snapshot = cached.map(|(s, _)| s.clone());
        let stale = cached.is_some_and(|(_, stale)| stale);

        let (ui_state, error) = match &self.outcome {
            None => (UiState::Loading, None),
            Some(PollOutcome::Exhausted(message)) => (UiState::Error, Some(message.clone())),
            Some(PollOutcome::Empty) => (UiState::Empty, None),
            Some(PollOutcome::Fresh) if snapshot.is_some() => (UiState::Success, None),
            // Cache expired while the poller was idle
            Some(PollOutcome::Fresh) => (UiState::Loading, None),
        };

        StatusView { connection_type: source, ui_state, snapshot, stale, error }
    }
}

struct Inner {
    fetcher: Arc<dyn StatusFetcher>,
    interval: Duration,
    state: watch::Sender<PollState>,
    active: watch::Sender<bool>,
    cancel: CancellationToken,
}

/// Pulls the status on a timer while active.
#[derive(Clone)]
pub struct StatusPoller {
    inner: Arc<Inner>,
}

impl StatusPoller {
    /// Creates an inactive poller.
    pub fn new(fetcher: Arc<dyn StatusFetcher>, interval: Duration, cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(PollState::default());
        let (active, _) = watch::channel(false);
        StatusPoller {
            inner: Arc::new(Inner {
                fetcher,
                interval: interval.max(Duration::from_millis(1)),
                state,
                active,
                cancel,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Starts or pauses pulling. A resumed poller pulls right away.
    pub fn set_active(&self, active: bool) {
        self.inner.active.send_if_modified(|current| {
            let changed = *current != active;
            *current = active;
            changed
        });
    }

    pub fn is_active(&self) -> bool {
        *self.inner.active.borrow()
    }

    pub fn state(&self) -> PollState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }

    pub fn start(&self) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move { poller.run().await })
    }

    async fn run(&self) {
        let mut active = self.inner.active.subscribe();
        let cancel = &self.inner.cancel;
        loop {
            let resumed = tokio::select! {
                _ = cancel.cancelled() => false,
                resumed = async { active.wait_for(|a| *a).await.map(drop).is_ok() } => resumed,
            };
            if !resumed || !self.pull().await {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.inner.interval) => {}
                _ = async { active.wait_for(|a| !*a).await.map(drop).is_ok() } => {}
            }
        }
        tracing::debug!("status poller stopped");
    }

    /// One round: the first pull plus up to [`MAX_POLL_RETRIES`] retries.
    /// Returns `false` if cancelled.
    async fn pull(&self) -> bool {
        let mut retries = 0;
        loop {
            match self.inner.fetcher.fetch(&self.inner.cancel).await {
                Ok(snapshot) => {
                    if snapshot.is_none() {
                        tracing::debug!("status poll returned no payload");
                    }
                    self.inner.state.send_modify(|s| s.record(snapshot, Instant::now()));
                    return true;
                }
                Err(ProbeError::Cancelled) => return false,
                Err(e) if retries < MAX_POLL_RETRIES => {
                    let delay = poll_retry_delay(retries);
                    tracing::debug!("status poll failed: {} (retry in {:?})", e, delay);
                    retries += 1;
                    tokio::select! {
                        _ = self.inner.cancel.cancelled() => return false,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => {
                    tracing::warn!("status poll failed after {} retries: {}", retries, e);
                    self.inner.state.send_modify(|s| s.record_exhausted(e.to_string()));
                    return true;
                }
            }
        }
    }
}
