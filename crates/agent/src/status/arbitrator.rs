// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Picks the status source and classifies it for display.

use std::sync::Arc;
use std::time::Duration;

use kiosk_core::{StatusSource, StatusView, UiState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::fetcher::StatusFetcher;
use super::poller::{PollState, StatusPoller};
use crate::channel::ChannelStatus;
use crate::config::AgentConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitratorConfig {
    pub demo_mode: bool,
    pub use_websocket: bool,
    pub polling_interval: Duration,
}

impl Default for ArbitratorConfig {
    fn default() -> Self {
        ArbitratorConfig {
            demo_mode: false,
            use_websocket: true,
            polling_interval: Duration::from_millis(5_000),
        }
    }
}

impl ArbitratorConfig {
    pub fn from_agent(config: &AgentConfig) -> Self {
        ArbitratorConfig {
            demo_mode: config.demo_mode,
            use_websocket: config.use_websocket,
            polling_interval: config.polling_interval(),
        }
    }
}

/// True when the push channel is the source to show.
pub fn websocket_active(config: &ArbitratorConfig, channel: &ChannelStatus) -> bool {
    !config.demo_mode
        && config.use_websocket
        && channel.state.is_connected()
        && channel.snapshot.is_some()
}

/// Selection order: demo, then a live push channel, then the poll.
pub fn select(
    config: &ArbitratorConfig,
    channel: &ChannelStatus,
    poll: &PollState,
    now: Instant,
) -> StatusView {
    if config.demo_mode {
        return StatusView::demo();
    }
    if websocket_active(config, channel) {
        return StatusView {
            connection_type: StatusSource::Websocket,
            ui_state: UiState::Success,
            snapshot: channel.snapshot.clone(),
            stale: false,
            error: None,
        };
    }

    let source = if config.use_websocket && channel.state.is_erroring() {
        StatusSource::PollingFallback
    } else {
        StatusSource::Polling
    };
    poll.view(source, now, config.polling_interval)
}

/// One status feed out of demo data, the push channel and the poll.
pub struct StatusSourceArbitrator {
    config: ArbitratorConfig,
    channel: Option<watch::Receiver<ChannelStatus>>,
    /// `None` in demo mode: nothing may touch the network.
    poller: Option<StatusPoller>,
    view: watch::Sender<StatusView>,
    cancel: CancellationToken,
}

impl StatusSourceArbitrator {
    /// `channel` is the push channel's feed, if one exists.
    pub fn new(
        config: ArbitratorConfig,
        channel: Option<watch::Receiver<ChannelStatus>>,
        fetcher: Arc<dyn StatusFetcher>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let poller = (!config.demo_mode)
            .then(|| StatusPoller::new(fetcher, config.polling_interval, cancel.child_token()));
        let channel = channel.filter(|_| !config.demo_mode);

        let initial = if config.demo_mode {
            StatusView::demo()
        } else {
            select(&config, &ChannelStatus::default(), &PollState::default(), Instant::now())
        };
        let (view, _) = watch::channel(initial);

        StatusSourceArbitrator { config, channel, poller, view, cancel }
    }

    /// The view as of now.
    pub fn current(&self) -> StatusView {
        let Some(poller) = &self.poller else {
            return StatusView::demo();
        };
        let channel = self.channel_status();
        select(&self.config, &channel, &poller.state(), Instant::now())
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusView> {
        self.view.subscribe()
    }

    /// Starts the poller and the re-evaluation loop. Demo mode starts nothing.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let Some(poller) = self.poller.clone() else {
            tracing::debug!("demo mode: status arbitrator serves synthetic data");
            return Vec::new();
        };
        let poll_task = poller.start();
        let loop_task = tokio::spawn(arbitrate(
            self.config.clone(),
            self.channel.clone(),
            poller,
            self.view.clone(),
            self.cancel.clone(),
        ));
        vec![poll_task, loop_task]
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn channel_status(&self) -> ChannelStatus {
        self.channel.as_ref().map(|rx| rx.borrow().clone()).unwrap_or_default()
    }
}

impl Drop for StatusSourceArbitrator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn arbitrate(
    config: ArbitratorConfig,
    mut channel: Option<watch::Receiver<ChannelStatus>>,
    poller: StatusPoller,
    view: watch::Sender<StatusView>,
    cancel: CancellationToken,
) {
    let mut poll = poller.subscribe();
    // Staleness is a function of time, so re-evaluate between feed changes too
    let tick = (config.polling_interval / 2).max(Duration::from_millis(1));
    let mut last_source = None;

    loop {
        let channel_status =
            channel.as_ref().map(|rx| rx.borrow().clone()).unwrap_or_default();
        poller.set_active(!websocket_active(&config, &channel_status));

        let next = select(&config, &channel_status, &poll.borrow_and_update(), Instant::now());
        if last_source != Some(next.connection_type) {
            tracing::info!("status source: {}", next.connection_type);
            last_source = Some(next.connection_type);
        }
        view.send_if_modified(|current| {
            let changed = *current != next;
            *current = next;
            changed
        });

        tokio::select! {
            _ = cancel.cancelled() => break,
            alive = channel_changed(&mut channel) => {
                if !alive {
                    channel = None;
                }
            }
            changed = poll.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep(tick) => {}
        }
    }
    tracing::debug!("status arbitrator stopped");
}

async fn channel_changed(channel: &mut Option<watch::Receiver<ChannelStatus>>) -> bool {
    match channel {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}
