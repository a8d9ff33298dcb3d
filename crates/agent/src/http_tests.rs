// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test(start_paused = true)]
async fn bounded_times_out() {
    let cancel = CancellationToken::new();
    let result: Result<(), _> = bounded(
        std::future::pending(),
        Duration::from_millis(5_000),
        &cancel,
    )
    .await;
    assert_eq!(result, Err(ProbeError::Timeout(Duration::from_millis(5_000))));
}

#[tokio::test(start_paused = true)]
async fn bounded_returns_inner_result() {
    let cancel = CancellationToken::new();
    let ok = bounded(async { Ok::<_, ProbeError>(7) }, PROBE_TIMEOUT, &cancel).await;
    assert_eq!(ok, Ok(7));

    let err = bounded(async { Err::<(), _>(ProbeError::Status(503)) }, PROBE_TIMEOUT, &cancel).await;
    assert_eq!(err, Err(ProbeError::Status(503)));
}

#[tokio::test(start_paused = true)]
async fn bounded_observes_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result: Result<(), _> = bounded(std::future::pending(), PROBE_TIMEOUT, &cancel).await;
    assert_eq!(result, Err(ProbeError::Cancelled));
}

#[test]
fn client_builds() {
    assert!(build_client(PROBE_TIMEOUT).is_ok());
}
