// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing notices.
//!
//! Components hand notices to an injected [`Notifier`]; what the host does
//! with them (toast, LED, log line) is its business.

use kiosk_core::ConnectionAlert;

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The backend link went down or came back.
    Connection(ConnectionAlert),
    /// Informational message, e.g. "nothing to sync".
    Info(String),
    /// A batch push landed.
    SyncSucceeded { files: usize },
    /// A batch push was rejected.
    SyncFailed { files: usize, message: String },
}

/// Receiver of user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Connection(ConnectionAlert::Lost) => {
                tracing::warn!("{}", ConnectionAlert::Lost.message())
            }
            Notice::Connection(alert) => tracing::info!("{}", alert.message()),
            Notice::Info(message) => tracing::info!("{}", message),
            Notice::SyncSucceeded { files } => tracing::info!("synced {} file(s)", files),
            Notice::SyncFailed { files, message } => {
                tracing::warn!("sync of {} file(s) failed: {}", files, message)
            }
        }
    }
}
