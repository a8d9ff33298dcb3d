// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Timer-driven batch sync.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use kiosk_core::{clamp_interval, AutoSyncConfig, Clock, PendingSyncFile, SyncFileStatus};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::push::BatchPusher;
use super::queue::PendingSyncQueue;
use super::settings::ConfigRepository;
use super::store::StoreResult;
use crate::notify::{Notice, Notifier};

/// Result of one [`AutoSyncScheduler::trigger_sync`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SyncOutcome {
    /// The queue was empty; nothing was sent.
    NothingToSync,
    /// Another batch is in flight.
    AlreadySyncing,
    Synced { count: usize },
    Failed { count: usize, message: String },
}

/// `"Auto-sync: {n} file(s) [{categories}] at {timestamp}"`, categories in
/// queue order without repeats.
pub fn commit_message(files: &[PendingSyncFile], at: DateTime<Utc>) -> String {
    let mut categories: Vec<&str> = Vec::new();
    for file in files {
        if !categories.contains(&file.category.as_str()) {
            categories.push(&file.category);
        }
    }
    format!(
        "Auto-sync: {} file(s) [{}] at {}",
        files.len(),
        categories.join(", "),
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Resets the in-flight flag however the batch ends.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    queue: PendingSyncQueue,
    pusher: Arc<dyn BatchPusher>,
    repo: Arc<dyn ConfigRepository>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: watch::Sender<AutoSyncConfig>,
    is_syncing: AtomicBool,
    /// Set by `start`; mutations only arm the timer once running.
    running: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

/// Owns [`AutoSyncConfig`] and flushes the queue on its interval.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AutoSyncScheduler {
    inner: Arc<Inner>,
}

impl AutoSyncScheduler {
    /// Loads the settings from `repo`, falling back to defaults on failure.
    pub fn new(
        queue: PendingSyncQueue,
        pusher: Arc<dyn BatchPusher>,
        repo: Arc<dyn ConfigRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = match repo.load() {
            Ok(config) => config.normalized(),
            Err(e) => {
                tracing::warn!("using default auto-sync settings: {}", e);
                AutoSyncConfig::default()
            }
        };
        let (config, _) = watch::channel(config);

        AutoSyncScheduler {
            inner: Arc::new(Inner {
                queue,
                pusher,
                repo,
                notifier,
                clock,
                config,
                is_syncing: AtomicBool::new(false),
                running: AtomicBool::new(false),
                timer: Mutex::new(None),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> AutoSyncConfig {
        self.inner.config.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutoSyncConfig> {
        self.inner.config.subscribe()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.config.borrow().enabled
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.is_syncing.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.update(|c| c.enabled = true);
    }

    pub fn disable(&self) {
        self.update(|c| c.enabled = false);
    }

    /// Flips `enabled` and returns the new value.
    pub fn toggle(&self) -> bool {
        self.update(|c| c.enabled = !c.enabled).enabled
    }

    /// Clamps to `[1, 1440]`, persists, and returns the stored value.
    pub fn set_sync_interval(&self, minutes: i64) -> u32 {
        self.update(|c| c.interval_minutes = clamp_interval(minutes)).interval_minutes
    }

    /// When the next sync is due, or `None` while disabled.
    pub fn next_sync(&self) -> Option<DateTime<Utc>> {
        let config = self.config();
        config.enabled.then(|| config.next_sync_from(self.inner.clock.now()))
    }

    /// Whole seconds until the next sync, or `None` while disabled.
    pub fn time_until_next_sync(&self) -> Option<i64> {
        let next = self.next_sync()?;
        Some((next - self.inner.clock.now()).num_seconds().max(0))
    }

    /// Purges `synced` rows. Never runs on its own.
    pub fn clear_synced_files(&self) -> StoreResult<usize> {
        let purged = self.inner.queue.store().purge_synced()?;
        tracing::info!("cleared {} synced file record(s)", purged.len());
        Ok(purged.len())
    }

    /// Arms the timer if enabled. Later mutations re-arm it.
    pub fn start(&self) {
        self.inner.running.store(true, Ordering::SeqCst);
        self.rearm();
    }

    /// Disarms the timer for good.
    pub fn shutdown(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.cancel.cancel();
        self.disarm();
    }

    /// True while a timer task is armed.
    pub fn is_armed(&self) -> bool {
        match self.inner.timer.lock() {
            Ok(timer) => timer.as_ref().is_some_and(|t| !t.is_finished()),
            Err(poisoned) => poisoned.into_inner().as_ref().is_some_and(|t| !t.is_finished()),
        }
    }

    /// Pushes every queued file as one batch.
    pub async fn trigger_sync(&self) -> SyncOutcome {
        if self
            .inner
            .is_syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sync already in flight");
            return SyncOutcome::AlreadySyncing;
        }
        let _guard = SyncingGuard(&self.inner.is_syncing);

        let outcome = self.sync_batch().await;
        match &outcome {
            SyncOutcome::NothingToSync => {
                self.inner.notifier.notify(Notice::Info("No files to sync".to_string()));
            }
            SyncOutcome::Synced { count } => {
                self.inner.notifier.notify(Notice::SyncSucceeded { files: *count });
            }
            SyncOutcome::Failed { count, message } => {
                self.inner.notifier.notify(Notice::SyncFailed {
                    files: *count,
                    message: message.clone(),
                });
            }
            SyncOutcome::AlreadySyncing => {}
        }
        outcome
    }

    async fn sync_batch(&self) -> SyncOutcome {
        let store = self.inner.queue.store();
        let files = match self.inner.queue.refresh() {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("failed to read sync queue: {}", e);
                return SyncOutcome::Failed { count: 0, message: e.to_string() };
            }
        };
        if files.is_empty() {
            return SyncOutcome::NothingToSync;
        }

        let count = files.len();
        let ids: Vec<String> = files.iter().map(|f| f.id.clone()).collect();
        if let Err(e) = store.set_status(&ids, SyncFileStatus::Syncing, None, None) {
            tracing::error!("failed to mark batch as syncing: {}", e);
            return SyncOutcome::Failed { count, message: e.to_string() };
        }

        let message = commit_message(&files, self.inner.clock.now());
        tracing::info!("pushing {} file(s)", count);

        match self.inner.pusher.push(&files, &message).await {
            Ok(()) => {
                let now = self.inner.clock.now();
                self.update(|c| c.last_sync_at = Some(now));
                if let Err(e) = store.set_status(&ids, SyncFileStatus::Synced, Some(now), None) {
                    tracing::error!("batch pushed but marking it synced failed: {}", e);
                    let message = e.to_string();
                    self.release(&ids, &message);
                    return SyncOutcome::Failed { count, message };
                }
                SyncOutcome::Synced { count }
            }
            Err(e) => {
                let message = e.to_string();
                self.release(&ids, &message);
                SyncOutcome::Failed { count, message }
            }
        }
    }

    /// Marks an unfinished batch `error` so the next tick picks it up again.
    /// Rows still stuck after this are recovered when the queue next loads.
    fn release(&self, ids: &[String], message: &str) {
        if let Err(e) =
            self.inner.queue.store().set_status(ids, SyncFileStatus::Error, None, Some(message))
        {
            tracing::error!("failed to mark batch as failed: {}", e);
        }
    }

    /// Applies `f`, persists on change, and re-arms the timer when the
    /// schedule moved.
    fn update(&self, f: impl FnOnce(&mut AutoSyncConfig)) -> AutoSyncConfig {
        let mut schedule_changed = false;
        let changed = self.inner.config.send_if_modified(|config| {
            let before = config.clone();
            f(config);
            schedule_changed = before.enabled != config.enabled
                || before.interval_minutes != config.interval_minutes;
            *config != before
        });
        let config = self.config();

        if changed {
            if let Err(e) = self.inner.repo.save(&config) {
                tracing::warn!("failed to persist auto-sync settings: {}", e);
            }
        }
        if schedule_changed {
            tracing::info!(
                "auto-sync {} every {} minute(s)",
                if config.enabled { "enabled" } else { "disabled" },
                config.interval_minutes
            );
            if self.inner.running.load(Ordering::SeqCst) {
                self.rearm();
            }
        }
        config
    }

    fn rearm(&self) {
        self.disarm();
        let config = self.config();
        if !config.enabled || self.inner.cancel.is_cancelled() {
            return;
        }

        let period = Duration::from_secs(u64::from(config.interval_minutes) * 60);
        let scheduler = self.clone();
        let task = tokio::spawn(async move { scheduler.tick(period).await });
        match self.inner.timer.lock() {
            Ok(mut timer) => *timer = Some(task),
            Err(poisoned) => *poisoned.into_inner() = Some(task),
        }
    }

    fn disarm(&self) {
        let task = match self.inner.timer.lock() {
            Ok(mut timer) => timer.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.abort();
        }
    }

    async fn tick(&self, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tracing::debug!("auto-sync timer fired");
            // Detached so re-arming the timer never cuts a batch in half
            let scheduler = self.clone();
            tokio::spawn(async move { scheduler.trigger_sync().await });
        }
    }
}
