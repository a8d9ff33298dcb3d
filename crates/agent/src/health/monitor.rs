// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic health probing with failure tracking.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use kiosk_core::{Clock, ConnectionState, HealthSnapshot, ProbeOutcome};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::probe::HealthProbe;
use crate::config::AgentConfig;
use crate::http::ProbeError;
use crate::notify::{Notice, Notifier};

/// Timing policy for the monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthConfig {
    /// Pin the link to `online` and never probe.
    pub demo_mode: bool,
    /// Delay before the first probe.
    pub initial_delay: Duration,
    /// Probe cadence while the link is up.
    pub interval: Duration,
    /// Ceiling for the failure backoff.
    pub max_backoff: Duration,
    /// Probe at the backoff delay (instead of `interval`) after a failure.
    pub apply_backoff: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        HealthConfig {
            demo_mode: false,
            initial_delay: Duration::from_millis(2_000),
            interval: Duration::from_millis(30_000),
            max_backoff: Duration::from_millis(60_000),
            apply_backoff: true,
        }
    }
}

impl HealthConfig {
    pub fn from_agent(config: &AgentConfig) -> Self {
        HealthConfig {
            demo_mode: config.demo_mode,
            initial_delay: Duration::from_millis(config.health_initial_delay_ms),
            interval: Duration::from_millis(config.health_check_interval_ms.max(1)),
            max_backoff: Duration::from_millis(config.health_max_backoff_ms.max(1)),
            apply_backoff: config.health_apply_backoff,
        }
    }
}

/// Exponential failure backoff: doubles per failure up to a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Backoff { initial, current: initial, max }
    }

    /// The delay currently in effect.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Doubles the delay (capped) and returns it.
    pub fn on_failure(&mut self) -> Duration {
        self.current = std::cmp::min(self.current.saturating_mul(2), self.max);
        self.current
    }

    /// Back to the initial delay.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

struct Inner {
    config: HealthConfig,
    probe: Arc<dyn HealthProbe>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    snapshot: watch::Sender<HealthSnapshot>,
    backoff: Mutex<Backoff>,
    /// Serializes probe cycles so a forced check never interleaves with the timer.
    cycle: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
}

/// Authoritative online/offline classification for the backend link.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ConnectionHealthMonitor {
    inner: Arc<Inner>,
}

impl ConnectionHealthMonitor {
    pub fn new(
        config: HealthConfig,
        probe: Arc<dyn HealthProbe>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let initial = if config.demo_mode {
            HealthSnapshot::pinned_online()
        } else {
            HealthSnapshot::default()
        };
        let (snapshot, _) = watch::channel(initial);
        // Backoff starts from the initial probe delay
        let backoff = Mutex::new(Backoff::new(
            config.initial_delay.max(Duration::from_millis(1)),
            config.max_backoff,
        ));

        ConnectionHealthMonitor {
            inner: Arc::new(Inner {
                config,
                probe,
                notifier,
                clock,
                snapshot,
                backoff,
                cycle: tokio::sync::Mutex::new(()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn status(&self) -> ConnectionState {
        self.inner.snapshot.borrow().state
    }

    pub fn last_check_at(&self) -> Option<DateTime<Utc>> {
        self.inner.snapshot.borrow().last_check_at
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.snapshot.borrow().consecutive_failures
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// The failure backoff currently tracked.
    pub fn current_backoff(&self) -> Duration {
        self.backoff(|b| b.current())
    }

    /// Resets the backoff and probes immediately, independent of the timer.
    pub async fn force_check(&self) -> HealthSnapshot {
        if self.inner.config.demo_mode {
            return self.snapshot();
        }
        self.backoff(|b| b.reset());
        self.check_once().await
    }

    /// Spawns the probe loop. It runs until [`shutdown`](Self::shutdown).
    pub fn start(&self) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run().await })
    }

    /// Stops the probe loop and cancels any probe in flight.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    async fn run(&self) {
        if self.inner.config.demo_mode {
            tracing::debug!("demo mode: health monitor pinned online");
            return;
        }

        let mut delay = self.inner.config.initial_delay;
        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            let snapshot = self.check_once().await;
            delay = self.next_delay(&snapshot);
        }
        tracing::debug!("health monitor stopped");
    }

    fn next_delay(&self, snapshot: &HealthSnapshot) -> Duration {
        if self.inner.config.apply_backoff && snapshot.consecutive_failures > 0 {
            self.current_backoff()
        } else {
            self.inner.config.interval
        }
    }

    async fn check_once(&self) -> HealthSnapshot {
        let _cycle = self.inner.cycle.lock().await;

        let outcome = match self.inner.probe.probe(&self.inner.cancel).await {
            Ok(()) => {
                self.backoff(|b| b.reset());
                ProbeOutcome::Success
            }
            Err(ProbeError::Cancelled) => return self.snapshot(),
            Err(e) => {
                let next = self.backoff(|b| b.on_failure());
                tracing::debug!("health probe failed: {} (backoff {:?})", e, next);
                ProbeOutcome::Failure
            }
        };

        let now = self.inner.clock.now();
        let mut alert = None;
        let mut previous = ConnectionState::Checking;
        self.inner.snapshot.send_modify(|snapshot| {
            previous = snapshot.state;
            alert = snapshot.apply(outcome, now);
        });

        let snapshot = self.snapshot();
        if snapshot.state != previous {
            tracing::info!("backend link {} -> {}", previous, snapshot.state);
        }
        if let Some(alert) = alert {
            self.inner.notifier.notify(Notice::Connection(alert));
        }
        snapshot
    }

    fn backoff<T>(&self, f: impl FnOnce(&mut Backoff) -> T) -> T {
        match self.inner.backoff.lock() {
            Ok(mut backoff) => f(&mut *backoff),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
    }
}
