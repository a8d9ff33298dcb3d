// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared plumbing for the HTTP probes.
//!
//! Every probe runs under [`bounded`], so a hung request can never stall a
//! probe cycle past its deadline or outlive teardown.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Deadline applied to health probes and reachability checks.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Transient network failure of a probe or poll.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The deadline passed before a response arrived.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Teardown cancelled the request.
    #[error("cancelled")]
    Cancelled,

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The request never got an answer.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body was unusable.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProbeError::Timeout(PROBE_TIMEOUT)
        } else if let Some(status) = e.status() {
            ProbeError::Status(status.as_u16())
        } else {
            ProbeError::Request(e.to_string())
        }
    }
}

/// Runs `fut` until it completes, `timeout` elapses, or `cancel` fires.
pub async fn bounded<T, F>(
    fut: F,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, ProbeError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(ProbeError::Cancelled),
        _ = tokio::time::sleep(timeout) => Err(ProbeError::Timeout(timeout)),
        result = fut => result,
    }
}

/// Builds the client shared by the HTTP adapters.
///
/// Responses must never be served from a cache: each probe is a fresh look
/// at the link.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ProbeError> {
    use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .user_agent(concat!("kiosk-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProbeError::Request(e.to_string()))
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
