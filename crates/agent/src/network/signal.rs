// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Link signal sources.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Best-effort link quality. Fields are `None` when the platform exposes nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkMetrics {
    /// e.g. `wifi`, `ethernet`, `4g`.
    pub connection_type: Option<String>,
    /// Estimated downlink, Mbit/s.
    pub downlink: Option<f64>,
    /// Estimated round-trip time, milliseconds.
    pub rtt: Option<u32>,
}

/// One OS-level link notification.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkSignal {
    Online,
    Offline,
    /// Link characteristics changed without an online/offline edge.
    Changed(LinkMetrics),
}

/// Producer of link signals.
pub trait LinkSignalSource: Send + 'static {
    /// Online state assumed before the first signal.
    fn initially_online(&self) -> bool {
        true
    }

    /// Sends signals into `tx` until `cancel` fires or the source runs dry.
    fn run(
        self: Box<Self>,
        tx: mpsc::Sender<LinkSignal>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, ()>;
}

/// Source fed by the host, for platforms that already deliver link events.
pub struct ManualLinkSource {
    rx: mpsc::Receiver<LinkSignal>,
    initially_online: bool,
}

impl ManualLinkSource {
    /// Returns the source and the sender the host pushes signals into.
    pub fn new(initially_online: bool) -> (Self, mpsc::Sender<LinkSignal>) {
        let (tx, rx) = mpsc::channel(16);
        (ManualLinkSource { rx, initially_online }, tx)
    }
}

impl LinkSignalSource for ManualLinkSource {
    fn initially_online(&self) -> bool {
        self.initially_online
    }

    fn run(
        mut self: Box<Self>,
        tx: mpsc::Sender<LinkSignal>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            loop {
                let signal = tokio::select! {
                    _ = cancel.cancelled() => return,
                    signal = self.rx.recv() => signal,
                };
                let Some(signal) = signal else { return };
                if tx.send(signal).await.is_err() {
                    return;
                }
            }
        })
    }
}

/// Watches a TCP endpoint and reports online/offline edges.
///
/// Plain TCP exposes no link quality, so this source never sends
/// [`LinkSignal::Changed`].
pub struct TcpLinkWatcher {
    target: String,
    interval: Duration,
    timeout: Duration,
}

impl TcpLinkWatcher {
    pub fn new(target: impl Into<String>, interval: Duration) -> Self {
        TcpLinkWatcher { target: target.into(), interval, timeout: crate::http::PROBE_TIMEOUT }
    }

    async fn reachable(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.target)).await,
            Ok(Ok(_))
        )
    }
}

impl LinkSignalSource for TcpLinkWatcher {
    fn run(
        self: Box<Self>,
        tx: mpsc::Sender<LinkSignal>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let mut online = self.initially_online();
            loop {
                let now_online = tokio::select! {
                    _ = cancel.cancelled() => return,
                    reachable = self.reachable() => reachable,
                };
                if now_online != online {
                    online = now_online;
                    tracing::debug!("link to {} is {}", self.target, if online { "up" } else { "down" });
                    let signal = if online { LinkSignal::Online } else { LinkSignal::Offline };
                    if tx.send(signal).await.is_err() {
                        return;
                    }
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
        })
    }
}
