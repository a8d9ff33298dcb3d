// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Active backend health monitoring.
//!
//! The monitor probes `GET {api_base}/health` on a timer, classifies the link
//! through [`kiosk_core::HealthSnapshot::apply`], and raises one alert per
//! `online ⇄ offline` edge.

mod monitor;
mod probe;

pub use monitor::{Backoff, ConnectionHealthMonitor, HealthConfig};
pub use probe::{HealthProbe, HttpHealthProbe};
