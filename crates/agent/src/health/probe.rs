// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Health probe abstraction.

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::http::{bounded, build_client, ProbeError, PROBE_TIMEOUT};

/// One lightweight reachability request against the backend.
pub trait HealthProbe: Send + Sync {
    /// Resolves `Ok(())` if the backend answered with a success status.
    fn probe<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<(), ProbeError>>;
}

/// HTTP probe with a 5 second deadline and caching disabled.
///
/// The health monitor uses `GET {api_base}/health`; the network observer's
/// advisory check uses a `HEAD` against the same URL.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    method: reqwest::Method,
    url: String,
}

impl HttpHealthProbe {
    /// `GET` probe.
    pub fn new(url: impl Into<String>) -> Result<Self, ProbeError> {
        Ok(HttpHealthProbe {
            client: build_client(PROBE_TIMEOUT)?,
            method: reqwest::Method::GET,
            url: url.into(),
        })
    }

    /// `HEAD` probe, for checks that only care whether anything answers.
    pub fn head(url: impl Into<String>) -> Result<Self, ProbeError> {
        Ok(HttpHealthProbe { method: reqwest::Method::HEAD, ..Self::new(url)? })
    }
}

impl HealthProbe for HttpHealthProbe {
    fn probe<'a>(&'a self, cancel: &'a CancellationToken) -> BoxFuture<'a, Result<(), ProbeError>> {
        Box::pin(bounded(
            async move {
                let response = self.client.request(self.method.clone(), &self.url).send().await?;
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(ProbeError::Status(status.as_u16()))
                }
            },
            PROBE_TIMEOUT,
            cancel,
        ))
    }
}
