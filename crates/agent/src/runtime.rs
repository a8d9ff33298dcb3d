// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Component wiring for `kiosk-agent run`.
//!
//! [`Agent::start`] builds every component from an [`AgentConfig`] in
//! dependency order and starts their tasks; [`Agent::shutdown`] tears them
//! down in reverse. Demo mode builds no network-facing component at all.

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::{Clock, SystemClock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelState, RealtimeStatusChannel, WebSocketTransport};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::health::{ConnectionHealthMonitor, HealthConfig, HttpHealthProbe};
use crate::network::{NetworkSignalObserver, NetworkStatus, TcpLinkWatcher};
use crate::notify::Notifier;
use crate::status::{ArbitratorConfig, HttpStatusFetcher, StatusSourceArbitrator};
use crate::sync::{
    AutoSyncScheduler, HttpBatchPusher, PendingSyncQueue, SqliteFileStore, TomlConfigRepository,
};

/// Grace period for component tasks to exit on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Opens the pending-file store and builds the queue and scheduler.
///
/// The scheduler is returned unarmed; call `start` to arm its timer.
pub fn build_sync(
    config: &AgentConfig,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
) -> Result<(PendingSyncQueue, AutoSyncScheduler)> {
    let store = Arc::new(SqliteFileStore::open(&config.database_path())?);
    let queue = PendingSyncQueue::new(store)?;
    let pusher = Arc::new(HttpBatchPusher::new(config.push_url(), config.content_root())?);
    let repo = Arc::new(TomlConfigRepository::new(config.auto_sync_path()));
    let scheduler = AutoSyncScheduler::new(queue.clone(), pusher, repo, notifier, clock);
    Ok((queue, scheduler))
}

/// Every running component.
pub struct Agent {
    observer: Option<NetworkSignalObserver>,
    monitor: ConnectionHealthMonitor,
    channel: Option<Arc<RealtimeStatusChannel>>,
    arbitrator: StatusSourceArbitrator,
    queue: PendingSyncQueue,
    scheduler: AutoSyncScheduler,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Agent {
    /// Builds and starts all components. Must be called inside a tokio runtime.
    pub fn start(config: &AgentConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        let observer = if config.demo_mode {
            None
        } else {
            let watcher =
                TcpLinkWatcher::new(config.reachability_target()?, config.link_poll_interval());
            let probe = Arc::new(HttpHealthProbe::head(config.health_url())?);
            Some(NetworkSignalObserver::new(Box::new(watcher), probe, clock.clone()))
        };

        let probe = Arc::new(HttpHealthProbe::new(config.health_url())?);
        let monitor = ConnectionHealthMonitor::new(
            HealthConfig::from_agent(config),
            probe,
            notifier.clone(),
            clock.clone(),
        );
        tasks.push(monitor.start());

        let channel = if !config.demo_mode && config.use_websocket {
            let url = config.channel_url()?;
            tracing::info!("status channel at {}", url);
            let channel = Arc::new(RealtimeStatusChannel::spawn(
                url,
                Box::new(WebSocketTransport::new()),
            ));
            channel.connect();
            Some(channel)
        } else {
            None
        };

        let fetcher = Arc::new(HttpStatusFetcher::new(config.status_url())?);
        let arbitrator = StatusSourceArbitrator::new(
            ArbitratorConfig::from_agent(config),
            channel.as_ref().map(|c| c.subscribe()),
            fetcher,
        );
        tasks.extend(arbitrator.start());

        if let Some(observer) = &observer {
            tasks.push(tokio::spawn(follow_link(
                observer.subscribe(),
                monitor.clone(),
                channel.clone(),
                cancel.child_token(),
            )));
        }

        let (queue, scheduler) = build_sync(config, notifier, clock)?;
        tasks.push(queue.start());
        scheduler.start();

        tracing::info!(
            "agent started (demo_mode={}, websocket={}, {} queued file(s))",
            config.demo_mode,
            channel.is_some(),
            queue.len()
        );

        Ok(Agent { observer, monitor, channel, arbitrator, queue, scheduler, cancel, tasks })
    }

    pub fn monitor(&self) -> &ConnectionHealthMonitor {
        &self.monitor
    }

    pub fn arbitrator(&self) -> &StatusSourceArbitrator {
        &self.arbitrator
    }

    pub fn observer(&self) -> Option<&NetworkSignalObserver> {
        self.observer.as_ref()
    }

    pub fn channel(&self) -> Option<&RealtimeStatusChannel> {
        self.channel.as_deref()
    }

    pub fn queue(&self) -> &PendingSyncQueue {
        &self.queue
    }

    pub fn scheduler(&self) -> &AutoSyncScheduler {
        &self.scheduler
    }

    /// Stops timers first, then closes the channel without retry.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.scheduler.shutdown();
        self.queue.shutdown();
        self.arbitrator.shutdown();
        if let Some(channel) = &self.channel {
            channel.shutdown().await;
        }
        self.monitor.shutdown();
        if let Some(observer) = &self.observer {
            observer.dispose();
        }

        for task in self.tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {}
                Ok(Err(e)) => tracing::warn!("component task failed: {}", e),
                Err(_) => tracing::warn!("component task did not stop in time"),
            }
        }
        tracing::info!("agent stopped");
    }
}

/// When the OS link comes back, re-probe the backend right away and revive a
/// channel that gave up while the link was down.
async fn follow_link(
    mut network: watch::Receiver<NetworkStatus>,
    monitor: ConnectionHealthMonitor,
    channel: Option<Arc<RealtimeStatusChannel>>,
    cancel: CancellationToken,
) {
    let mut was_online = network.borrow_and_update().is_online;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = network.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let is_online = network.borrow_and_update().is_online;
        if is_online == was_online {
            continue;
        }
        was_online = is_online;
        if !is_online {
            tracing::info!("link down");
            continue;
        }

        tracing::info!("link up, re-checking backend");
        let snapshot = monitor.force_check().await;
        tracing::debug!("backend is {}", snapshot.state);
        if let Some(channel) = &channel {
            if channel.state() == ChannelState::Failed {
                channel.reconnect();
            }
        }
    }
}

/// Runs every component until Ctrl-C.
pub async fn run(config: AgentConfig, notifier: Arc<dyn Notifier>) -> Result<()> {
    let agent = Agent::start(&config, notifier)?;
    let mut views = agent.arbitrator().subscribe();
    let mut health = agent.monitor().subscribe();

    let mut last = views.borrow_and_update().clone();
    tracing::info!("status: {} ({})", last.connection_type, last.ui_state);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!("failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if view.connection_type != last.connection_type || view.ui_state != last.ui_state {
                    tracing::info!("status: {} ({})", view.connection_type, view.ui_state);
                } else if view.stale && !last.stale {
                    tracing::debug!("status from {} is stale", view.connection_type);
                }
                last = view;
            }
            changed = health.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = health.borrow_and_update().clone();
                tracing::debug!(
                    "backend {} ({} consecutive failure(s))",
                    snapshot.state,
                    snapshot.consecutive_failures
                );
            }
        }
    }

    tracing::info!("shutting down");
    agent.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
