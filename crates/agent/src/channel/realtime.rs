// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel driver.
//!
//! One task owns the transport and the single retry timer. Callers talk to it
//! through [`RealtimeStatusChannel`] and observe it through a watch feed.

use std::sync::Mutex;
use std::time::Duration;

use kiosk_core::StatusSnapshot;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::fsm::{transition, ChannelEvent, ChannelState, Effect, MAX_RECONNECT_ATTEMPTS};
use super::transport::Transport;

/// Upper bound on a single open attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What the channel currently knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelStatus {
    pub state: ChannelState,
    pub attempt: u32,
    /// Latest decoded frame. Survives reconnects.
    pub snapshot: Option<StatusSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Connect,
    Reconnect,
    Disconnect,
    Shutdown,
}

impl Command {
    fn event(self) -> ChannelEvent {
        match self {
            Command::Connect => ChannelEvent::Connect,
            Command::Reconnect => ChannelEvent::Reconnect,
            Command::Disconnect | Command::Shutdown => ChannelEvent::Disconnect,
        }
    }
}

/// Handle to the push channel.
pub struct RealtimeStatusChannel {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ChannelStatus>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RealtimeStatusChannel {
    /// Spawns the driver in `idle`. Nothing is opened until [`connect`](Self::connect).
    pub fn spawn(url: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ChannelStatus::default());
        let driver = Driver {
            url: url.into(),
            transport,
            commands: rx,
            status: status_tx,
            retry_at: None,
            stopping: false,
        };
        let task = tokio::spawn(driver.run());
        RealtimeStatusChannel { commands, status, task: Mutex::new(Some(task)) }
    }

    /// Opens the channel. A no-op while it is open or already trying to open.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Resets the attempt counter and reconnects now, even from `failed`.
    pub fn reconnect(&self) {
        self.send(Command::Reconnect);
    }

    /// Clears any pending retry, then closes the socket. No retry follows.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    /// Disconnects and waits for the driver task to exit.
    pub async fn shutdown(&self) {
        self.send(Command::Shutdown);
        let task = match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("status channel driver ended abnormally: {}", e);
            }
        }
    }

    pub fn status(&self) -> ChannelStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> ChannelState {
        self.status.borrow().state
    }

    pub fn snapshot(&self) -> Option<StatusSnapshot> {
        self.status.borrow().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("status channel already shut down; {:?} ignored", command);
        }
    }
}

struct Driver {
    url: String,
    transport: Box<dyn Transport>,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ChannelStatus>,
    /// The only retry timer this channel ever has.
    retry_at: Option<Instant>,
    stopping: bool,
}

impl Driver {
    async fn run(mut self) {
        while !self.stopping {
            let connected = self.state().is_connected();
            let retry_at = self.retry_at;

            let event = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => command.event(),
                },
                _ = sleep_until(retry_at), if retry_at.is_some() => {
                    self.retry_at = None;
                    ChannelEvent::RetryDue
                }
                frame = self.transport.recv(), if connected => match frame {
                    Ok(Some(text)) => {
                        self.accept(&text);
                        continue;
                    }
                    Ok(None) => {
                        tracing::warn!("status channel closed by server");
                        ChannelEvent::Lost
                    }
                    Err(e) => {
                        tracing::warn!("status channel error: {}", e);
                        ChannelEvent::Lost
                    }
                },
            };
            self.apply(event).await;
        }

        self.apply(ChannelEvent::Disconnect).await;
        tracing::debug!("status channel driver stopped");
    }

    fn state(&self) -> ChannelState {
        self.status.borrow().state
    }

    /// Runs `event` and every event its effects produce.
    async fn apply(&mut self, event: ChannelEvent) {
        let mut next_event = Some(event);
        while let Some(event) = next_event.take() {
            let before = self.state();
            let (after, effect) = transition(before, event);
            self.set_state(after);

            if after != before {
                tracing::debug!("status channel {} -> {} on {:?}", before, after, event);
                match after {
                    ChannelState::Connected => tracing::info!("status channel connected"),
                    ChannelState::Failed => tracing::warn!(
                        "status channel gave up after {} reconnect attempts",
                        MAX_RECONNECT_ATTEMPTS
                    ),
                    _ => {}
                }
            }

            match effect {
                Effect::Nothing => {}
                Effect::ScheduleRetry(delay) => {
                    tracing::info!("status channel retry {} in {:?}", after.attempt(), delay);
                    self.retry_at = Some(Instant::now() + delay);
                }
                Effect::Close => {
                    self.retry_at = None;
                    self.close().await;
                }
                Effect::Open => {
                    self.retry_at = None;
                    next_event = Some(self.open().await);
                }
            }
        }
    }

    /// Opens the transport. Commands that arrive meanwhile can preempt it.
    async fn open(&mut self) -> ChannelEvent {
        self.close().await;

        let connect = tokio::time::timeout(CONNECT_TIMEOUT, self.transport.connect(&self.url));
        tokio::pin!(connect);
        loop {
            tokio::select! {
                result = &mut connect => {
                    return match result {
                        Ok(Ok(())) => ChannelEvent::Opened,
                        Ok(Err(e)) => {
                            tracing::warn!("status channel connect failed: {}", e);
                            ChannelEvent::Lost
                        }
                        Err(_) => {
                            tracing::warn!("status channel connect timed out after {:?}", CONNECT_TIMEOUT);
                            ChannelEvent::Lost
                        }
                    };
                }
                command = self.commands.recv() => match command {
                    Some(Command::Connect) => {}
                    Some(Command::Shutdown) | None => {
                        self.stopping = true;
                        return ChannelEvent::Disconnect;
                    }
                    Some(command) => return command.event(),
                },
            }
        }
    }

    async fn close(&mut self) {
        if self.transport.is_connected() {
            if let Err(e) = self.transport.disconnect().await {
                tracing::debug!("status channel close: {}", e);
            }
        }
    }

    /// Decodes one frame. Malformed frames are dropped.
    fn accept(&self, text: &str) {
        match StatusSnapshot::parse(text) {
            Ok(snapshot) => self.status.send_modify(|s| s.snapshot = Some(snapshot)),
            Err(e) => tracing::warn!("dropping malformed status frame: {}", e),
        }
    }

    fn set_state(&self, state: ChannelState) {
        self.status.send_if_modified(|s| {
            if s.state == state {
                return false;
            }
            s.state = state;
            s.attempt = state.attempt();
            true
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
