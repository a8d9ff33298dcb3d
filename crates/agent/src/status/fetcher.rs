// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pull-side status source.

use futures_util::future::BoxFuture;
use kiosk_core::StatusSnapshot;
use tokio_util::sync::CancellationToken;

use crate::http::{bounded, build_client, ProbeError, PROBE_TIMEOUT};

/// One status pull.
pub trait StatusFetcher: Send + Sync {
    /// `Ok(None)` means the pull succeeded but carried no usable payload.
    fn fetch<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<StatusSnapshot>, ProbeError>>;
}

/// `GET {api_base}/status`.
pub struct HttpStatusFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpStatusFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, ProbeError> {
        Ok(HttpStatusFetcher { client: build_client(PROBE_TIMEOUT)?, url: url.into() })
    }
}

impl StatusFetcher for HttpStatusFetcher {
    fn fetch<'a>(
        &'a self,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<StatusSnapshot>, ProbeError>> {
        Box::pin(bounded(
            async {
                let response = self.client.get(&self.url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ProbeError::Status(status.as_u16()));
                }
                let body = response.text().await?;
                decode_body(&body)
            },
            PROBE_TIMEOUT,
            cancel,
        ))
    }
}

/// Blank bodies, `null` and `{}` are empty results; anything else must be an object.
pub(crate) fn decode_body(body: &str) -> Result<Option<StatusSnapshot>, ProbeError> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Ok(None);
    }
    let snapshot =
        StatusSnapshot::parse(body).map_err(|e| ProbeError::InvalidResponse(e.to_string()))?;
    Ok((!snapshot.is_empty()).then_some(snapshot))
}
