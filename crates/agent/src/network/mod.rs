// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Passive link observation.
//!
//! A [`LinkSignalSource`] reports OS-level online/offline changes; the
//! [`NetworkSignalObserver`] folds them into a [`NetworkStatus`] and offers
//! an advisory one-shot reachability check.

mod observer;
mod signal;

pub use observer::{NetworkSignalObserver, NetworkStatus, WAS_OFFLINE_CLEAR_AFTER};
pub use signal::{LinkMetrics, LinkSignal, LinkSignalSource, ManualLinkSource, TcpLinkWatcher};
