// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Folds link signals into an observable [`NetworkStatus`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use kiosk_core::Clock;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::signal::{LinkMetrics, LinkSignal, LinkSignalSource};
use crate::health::HealthProbe;

/// How long `was_offline` survives renewed connectivity.
pub const WAS_OFFLINE_CLEAR_AFTER: Duration = Duration::from_secs(3);

/// Passive view of the local link.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub is_online: bool,
    /// Set when the link drops; cleared a short while after it returns.
    pub was_offline: bool,
    pub last_online_at: Option<DateTime<Utc>>,
    pub last_offline_at: Option<DateTime<Utc>>,
    pub metrics: Option<LinkMetrics>,
}

impl NetworkStatus {
    /// Applies one signal. Returns the new online state on an edge.
    fn apply(&mut self, signal: LinkSignal, now: DateTime<Utc>) -> Option<bool> {
        match signal {
            LinkSignal::Online if !self.is_online => {
                self.is_online = true;
                self.last_online_at = Some(now);
                Some(true)
            }
            LinkSignal::Offline if self.is_online => {
                self.is_online = false;
                self.was_offline = true;
                self.last_offline_at = Some(now);
                Some(false)
            }
            LinkSignal::Changed(metrics) => {
                self.metrics = Some(metrics);
                None
            }
            LinkSignal::Online | LinkSignal::Offline => None,
        }
    }
}

/// Listens to a [`LinkSignalSource`] for as long as it lives.
///
/// The listener tasks are installed by [`new`](Self::new) and removed by
/// [`dispose`](Self::dispose) or drop.
pub struct NetworkSignalObserver {
    status: watch::Sender<NetworkStatus>,
    probe: Arc<dyn HealthProbe>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkSignalObserver {
    /// Installs the listeners. Must be called inside a tokio runtime.
    pub fn new(
        source: Box<dyn LinkSignalSource>,
        probe: Arc<dyn HealthProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let status = NetworkStatus {
            is_online: source.initially_online(),
            ..NetworkStatus::default()
        };
        let (status, _) = watch::channel(status);
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(16);

        let source_task = tokio::spawn(source.run(tx, cancel.child_token()));
        let fold_task = tokio::spawn(fold(rx, status.clone(), clock, cancel.child_token()));

        NetworkSignalObserver {
            status,
            probe,
            cancel,
            tasks: Mutex::new(vec![source_task, fold_task]),
        }
    }

    pub fn is_online(&self) -> bool {
        self.status.borrow().is_online
    }

    pub fn was_offline(&self) -> bool {
        self.status.borrow().was_offline
    }

    pub fn last_online_at(&self) -> Option<DateTime<Utc>> {
        self.status.borrow().last_online_at
    }

    pub fn last_offline_at(&self) -> Option<DateTime<Utc>> {
        self.status.borrow().last_offline_at
    }

    /// Link quality, or `None` when the source reports none.
    pub fn metrics(&self) -> Option<LinkMetrics> {
        self.status.borrow().metrics.clone()
    }

    pub fn status(&self) -> NetworkStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    /// One advisory reachability probe. Never changes [`is_online`](Self::is_online).
    pub async fn check_connection(&self) -> bool {
        match self.probe.probe(&self.cancel).await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("reachability check failed: {}", e);
                false
            }
        }
    }

    /// Removes the listeners. Safe to call more than once.
    pub fn dispose(&self) {
        self.cancel.cancel();
        let tasks = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for task in tasks {
            task.abort();
        }
    }

    /// True once [`dispose`](Self::dispose) ran.
    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for NetworkSignalObserver {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn fold(
    mut rx: mpsc::Receiver<LinkSignal>,
    status: watch::Sender<NetworkStatus>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) {
    let mut clear_at: Option<Instant> = None;
    let mut open = true;

    loop {
        if !open && clear_at.is_none() {
            break;
        }
        let deadline = clear_at;
        let clear = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = clear => {
                clear_at = None;
                status.send_modify(|s| s.was_offline = false);
            }
            signal = rx.recv(), if open => {
                let Some(signal) = signal else {
                    open = false;
                    continue;
                };
                let now = clock.now();
                let mut edge = None;
                let mut was_offline = false;
                status.send_modify(|s| {
                    edge = s.apply(signal, now);
                    was_offline = s.was_offline;
                });
                match edge {
                    Some(true) => {
                        tracing::info!("link online");
                        clear_at = was_offline.then(|| Instant::now() + WAS_OFFLINE_CLEAR_AFTER);
                    }
                    Some(false) => {
                        tracing::info!("link offline");
                        clear_at = None;
                    }
                    None => {}
                }
            }
        }
    }
    tracing::debug!("network observer stopped");
}
