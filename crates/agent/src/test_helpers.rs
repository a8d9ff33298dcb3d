// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::BoxFuture;
use kiosk_core::{AutoSyncConfig, ManualClock, PendingSyncFile, StatusSnapshot};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::channel::{Transport, TransportError, TransportResult};
use crate::config::ConfigError;
use crate::health::HealthProbe;
use crate::http::ProbeError;
use crate::notify::{Notice, Notifier};
use crate::status::StatusFetcher;
use crate::sync::{BatchPusher, ConfigRepository, PushError};

/// A fixed point in time tests measure from.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    epoch() + chrono::Duration::seconds(secs)
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(epoch()))
}

pub fn make_file(id: &str, priority: i64, detected_secs: i64) -> PendingSyncFile {
    PendingSyncFile::new(
        id,
        format!("content/{id}.json"),
        format!("hash-{id}"),
        "config",
        priority,
        at(detected_secs),
    )
}

/// Probe that replays scripted results, then repeats a fallback.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<Result<(), ProbeError>>>,
    fallback: Mutex<Result<(), ProbeError>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn always(result: Result<(), ProbeError>) -> Arc<Self> {
        Arc::new(ScriptedProbe {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(result),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn up() -> Arc<Self> {
        Self::always(Ok(()))
    }

    pub fn down() -> Arc<Self> {
        Self::always(Err(ProbeError::Request("connection refused".into())))
    }

    pub fn push(&self, result: Result<(), ProbeError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn set_fallback(&self, result: Result<(), ProbeError>) {
        *self.fallback.lock().unwrap() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

impl HealthProbe for ScriptedProbe {
    fn probe<'a>(&'a self, _cancel: &'a CancellationToken) -> BoxFuture<'a, Result<(), ProbeError>> {
        let result = self.next();
        Box::pin(async move { result })
    }
}

/// Notifier that remembers everything it was told.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// What the scripted server does next.
#[derive(Debug, Clone)]
pub enum Frame {
    Text(String),
    Close,
    Error(String),
}

#[derive(Default)]
struct MockTransportState {
    connect_script: VecDeque<Result<(), TransportError>>,
    connect_fallback: Option<Result<(), TransportError>>,
    hang_connects: bool,
    connected: bool,
    connect_times: Vec<tokio::time::Instant>,
    disconnects: usize,
}

/// Test-side remote control for a [`MockTransport`].
#[derive(Clone)]
pub struct MockRemote {
    state: Arc<Mutex<MockTransportState>>,
    frames: mpsc::UnboundedSender<Frame>,
}

impl MockRemote {
    pub fn fail_connects(&self) {
        self.state.lock().unwrap().connect_fallback =
            Some(Err(TransportError::ConnectionFailed("refused".into())));
    }

    pub fn accept_connects(&self) {
        self.state.lock().unwrap().connect_fallback = None;
    }

    pub fn push_connect(&self, result: Result<(), TransportError>) {
        self.state.lock().unwrap().connect_script.push_back(result);
    }

    pub fn hang_connects(&self, hang: bool) {
        self.state.lock().unwrap().hang_connects = hang;
    }

    pub fn send(&self, frame: Frame) {
        self.frames.send(frame).unwrap();
    }

    pub fn text(&self, text: &str) {
        self.send(Frame::Text(text.to_string()));
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connect_times.len()
    }

    pub fn connect_times(&self) -> Vec<tokio::time::Instant> {
        self.state.lock().unwrap().connect_times.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

/// Transport driven by a [`MockRemote`]. Connects succeed unless scripted otherwise.
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
    frames: mpsc::UnboundedReceiver<Frame>,
}

impl MockTransport {
    pub fn new() -> (Box<Self>, MockRemote) {
        let state = Arc::new(Mutex::new(MockTransportState::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = MockTransport { state: state.clone(), frames: rx };
        (Box::new(transport), MockRemote { state, frames: tx })
    }
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        _url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let (result, hang) = {
                let mut state = self.state.lock().unwrap();
                state.connect_times.push(tokio::time::Instant::now());
                let result = state
                    .connect_script
                    .pop_front()
                    .or_else(|| state.connect_fallback.clone())
                    .unwrap_or(Ok(()));
                (result, state.hang_connects)
            };
            if hang {
                std::future::pending::<()>().await;
            }
            if result.is_ok() {
                self.state.lock().unwrap().connected = true;
            }
            result
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.connected = false;
            state.disconnects += 1;
            Ok(())
        })
    }

    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            let frame = match self.frames.recv().await {
                Some(frame) => frame,
                None => std::future::pending().await,
            };
            match frame {
                Frame::Text(text) => Ok(Some(text)),
                Frame::Close => {
                    self.state.lock().unwrap().connected = false;
                    Ok(None)
                }
                Frame::Error(reason) => {
                    self.state.lock().unwrap().connected = false;
                    Err(TransportError::ReceiveFailed(reason))
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}

/// Status fetcher that replays scripted pulls, then repeats a fallback.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Option<StatusSnapshot>, ProbeError>>>,
    fallback: Mutex<Result<Option<StatusSnapshot>, ProbeError>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn always(result: Result<Option<StatusSnapshot>, ProbeError>) -> Arc<Self> {
        Arc::new(ScriptedFetcher {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(result),
            calls: AtomicUsize::new(0),
        })
    }

    /// Always answers with `snapshot(json)`.
    pub fn serving(json: &str) -> Arc<Self> {
        Self::always(Ok(Some(snapshot(json))))
    }

    pub fn failing() -> Arc<Self> {
        Self::always(Err(ProbeError::Status(503)))
    }

    pub fn push(&self, result: Result<Option<StatusSnapshot>, ProbeError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn set_fallback(&self, result: Result<Option<StatusSnapshot>, ProbeError>) {
        *self.fallback.lock().unwrap() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatusFetcher for ScriptedFetcher {
    fn fetch<'a>(
        &'a self,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<Option<StatusSnapshot>, ProbeError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| self.fallback.lock().unwrap().clone());
        Box::pin(async move { result })
    }
}

pub fn snapshot(json: &str) -> StatusSnapshot {
    StatusSnapshot::parse(json).unwrap()
}

/// Config repository held in memory, with switchable failures.
#[derive(Default)]
pub struct MemoryConfigRepository {
    stored: Mutex<Option<AutoSyncConfig>>,
    saves: AtomicUsize,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
}

impl MemoryConfigRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with(config: AutoSyncConfig) -> Arc<Self> {
        let repo = Self::default();
        *repo.stored.lock().unwrap() = Some(config);
        Arc::new(repo)
    }

    pub fn stored(&self) -> Option<AutoSyncConfig> {
        self.stored.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

impl ConfigRepository for MemoryConfigRepository {
    fn load(&self) -> Result<AutoSyncConfig, ConfigError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(ConfigError::Read { path: "memory".into(), reason: "unavailable".into() });
        }
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, config: &AutoSyncConfig) -> Result<(), ConfigError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(ConfigError::Write { path: "memory".into(), reason: "read-only".into() });
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(config.clone());
        Ok(())
    }
}

/// One batch as the pusher saw it.
#[derive(Debug, Clone)]
pub struct PushedBatch {
    pub ids: Vec<String>,
    pub commit_message: String,
}

/// Pusher that records batches and answers from a script.
#[derive(Default)]
pub struct RecordingPusher {
    batches: Mutex<Vec<PushedBatch>>,
    script: Mutex<VecDeque<Result<(), PushError>>>,
    fallback: Mutex<Option<PushError>>,
    held: AtomicBool,
    release: tokio::sync::Notify,
}

impl RecordingPusher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        let pusher = Self::default();
        *pusher.fallback.lock().unwrap() = Some(PushError::Rejected(message.to_string()));
        Arc::new(pusher)
    }

    pub fn push_result(&self, result: Result<(), PushError>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Pushes block until [`release`](Self::release).
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    pub fn batches(&self) -> Vec<PushedBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl BatchPusher for RecordingPusher {
    fn push<'a>(
        &'a self,
        files: &'a [PendingSyncFile],
        commit_message: &'a str,
    ) -> BoxFuture<'a, Result<(), PushError>> {
        Box::pin(async move {
            self.batches.lock().unwrap().push(PushedBatch {
                ids: files.iter().map(|f| f.id.clone()).collect(),
                commit_message: commit_message.to_string(),
            });
            while self.held.load(Ordering::SeqCst) {
                let released = self.release.notified();
                if !self.held.load(Ordering::SeqCst) {
                    break;
                }
                released.await;
            }
            let scripted = self.script.lock().unwrap().pop_front();
            match scripted {
                Some(result) => result,
                None => match self.fallback.lock().unwrap().clone() {
                    Some(e) => Err(e),
                    None => Ok(()),
                },
            }
        })
    }
}
