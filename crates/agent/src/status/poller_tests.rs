// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the status poller and its cache.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use kiosk_core::{StatusSource, UiState};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::poller::*;
use crate::http::ProbeError;
use crate::test_helpers::{snapshot, ScriptedFetcher};

const INTERVAL: Duration = Duration::from_millis(5_000);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

async fn sleep_ms(n: u64) {
    tokio::time::sleep(ms(n)).await;
}

#[test]
fn retry_delays_are_capped() {
    let delays: Vec<_> = (0..5).map(|n| poll_retry_delay(n).as_millis()).collect();
    assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000, 8_000]);
}

#[tokio::test(start_paused = true)]
async fn view_is_loading_before_any_result() {
    let state = PollState::default();
    let view = state.view(StatusSource::Polling, Instant::now(), INTERVAL);
    assert_eq!(view.ui_state, UiState::Loading);
    assert_eq!(view.snapshot, None);
}

#[tokio::test(start_paused = true)]
async fn cache_goes_stale_then_expires() {
    let fetched = Instant::now();
    let mut state = PollState::default();
    state.record(Some(snapshot(r#"{"cpu": 1}"#)), fetched);

    let fresh = state.view(StatusSource::Polling, fetched + ms(2_500), INTERVAL);
    assert_eq!(fresh.ui_state, UiState::Success);
    assert!(!fresh.stale);

    let stale = state.view(StatusSource::Polling, fetched + ms(2_501), INTERVAL);
    assert_eq!(stale.ui_state, UiState::Success);
    assert!(stale.stale);
    assert!(stale.snapshot.is_some());

    let last = state.view(StatusSource::Polling, fetched + ms(10_000), INTERVAL);
    assert!(last.snapshot.is_some());

    let expired = state.view(StatusSource::Polling, fetched + ms(10_001), INTERVAL);
    assert_eq!(expired.snapshot, None);
    assert_eq!(expired.ui_state, UiState::Loading);
    assert!(!expired.stale);
}

#[tokio::test(start_paused = true)]
async fn empty_pull_clears_cache() {
    let now = Instant::now();
    let mut state = PollState::default();
    state.record(Some(snapshot(r#"{"cpu": 1}"#)), now);
    state.record(None, now);

    let view = state.view(StatusSource::Polling, now, INTERVAL);
    assert_eq!(view.ui_state, UiState::Empty);
    assert_eq!(view.snapshot, None);
}

#[tokio::test(start_paused = true)]
async fn exhausted_pull_is_error_and_keeps_cache() {
    let now = Instant::now();
    let mut state = PollState::default();
    state.record(Some(snapshot(r#"{"cpu": 1}"#)), now);
    state.record_exhausted("unexpected HTTP status 503");

    let view = state.view(StatusSource::PollingFallback, now + ms(3_000), INTERVAL);
    assert_eq!(view.connection_type, StatusSource::PollingFallback);
    assert_eq!(view.ui_state, UiState::Error);
    assert_eq!(view.error.as_deref(), Some("unexpected HTTP status 503"));
    assert!(view.snapshot.is_some());
    assert!(view.stale);
}

#[tokio::test(start_paused = true)]
async fn inactive_poller_never_fetches() {
    let fetcher = ScriptedFetcher::serving(r#"{"cpu": 1}"#);
    let poller = StatusPoller::new(fetcher.clone(), INTERVAL, CancellationToken::new());
    let _task = poller.start();

    sleep_ms(60_000).await;
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(poller.state().outcome(), None);
}

#[tokio::test(start_paused = true)]
async fn active_poller_pulls_on_interval() {
    let fetcher = ScriptedFetcher::serving(r#"{"cpu": 1}"#);
    let poller = StatusPoller::new(fetcher.clone(), INTERVAL, CancellationToken::new());
    let _task = poller.start();

    poller.set_active(true);
    sleep_ms(1).await;
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(poller.state().outcome(), Some(&PollOutcome::Fresh));

    sleep_ms(4_998).await;
    assert_eq!(fetcher.calls(), 1);
    sleep_ms(2).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn three_retries_then_error() {
    let fetcher = ScriptedFetcher::failing();
    let poller = StatusPoller::new(fetcher.clone(), INTERVAL, CancellationToken::new());
    let _task = poller.start();
    poller.set_active(true);

    // Pulls at 0, 1000, 3000 and 7000
    sleep_ms(1).await;
    assert_eq!(fetcher.calls(), 1);
    sleep_ms(6_998).await;
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(poller.state().outcome(), None);

    sleep_ms(2).await;
    assert_eq!(fetcher.calls(), 4);
    assert_eq!(
        poller.state().outcome(),
        Some(&PollOutcome::Exhausted("unexpected HTTP status 503".into()))
    );

    // Next round after the normal interval
    sleep_ms(5_000).await;
    assert_eq!(fetcher.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn retry_success_clears_error() {
    let fetcher = ScriptedFetcher::serving(r#"{"cpu": 2}"#);
    fetcher.push(Err(ProbeError::Timeout(ms(5_000))));
    let poller = StatusPoller::new(fetcher.clone(), INTERVAL, CancellationToken::new());
    let _task = poller.start();
    poller.set_active(true);

    sleep_ms(1_001).await;
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(poller.state().outcome(), Some(&PollOutcome::Fresh));
}

#[tokio::test(start_paused = true)]
async fn pausing_stops_pulls_and_resume_pulls_now() {
    let fetcher = ScriptedFetcher::serving(r#"{"cpu": 1}"#);
    let poller = StatusPoller::new(fetcher.clone(), INTERVAL, CancellationToken::new());
    let _task = poller.start();
    poller.set_active(true);
    sleep_ms(1).await;

    poller.set_active(false);
    sleep_ms(60_000).await;
    assert_eq!(fetcher.calls(), 1);

    poller.set_active(true);
    sleep_ms(1).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_poller() {
    let fetcher = ScriptedFetcher::serving(r#"{"cpu": 1}"#);
    let cancel = CancellationToken::new();
    let poller = StatusPoller::new(fetcher.clone(), INTERVAL, cancel.clone());
    let task = poller.start();
    poller.set_active(true);
    sleep_ms(1).await;

    cancel.cancel();
    task.await.unwrap();
    assert_eq!(fetcher.calls(), 1);
}
