// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `kiosk-agent check`: one advisory reachability check plus one health probe.

use std::sync::Arc;

use kiosk_core::{ConnectionState, HealthSnapshot, SystemClock};

use super::block_on;
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::health::{ConnectionHealthMonitor, HealthConfig, HttpHealthProbe};
use crate::network::{ManualLinkSource, NetworkSignalObserver};
use crate::notify::TracingNotifier;

/// What one check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Anything answered the `HEAD` request.
    pub reachable: bool,
    pub health: HealthSnapshot,
}

impl CheckReport {
    pub fn render(&self, url: &str) -> String {
        format!(
            "Backend: {}\nReachable: {}\nState: {}\nConsecutive failures: {}",
            url,
            if self.reachable { "yes" } else { "no" },
            self.health.state,
            self.health.consecutive_failures
        )
    }
}

pub fn run(config: &AgentConfig) -> Result<()> {
    let url = config.health_url();
    if config.demo_mode {
        println!("Demo mode: link pinned online, nothing probed");
        return Ok(());
    }

    let report = block_on(async {
        let (source, _signals) = ManualLinkSource::new(true);
        let observer = NetworkSignalObserver::new(
            Box::new(source),
            Arc::new(HttpHealthProbe::head(url.clone())?),
            Arc::new(SystemClock),
        );
        let monitor = ConnectionHealthMonitor::new(
            HealthConfig::from_agent(config),
            Arc::new(HttpHealthProbe::new(url.clone())?),
            Arc::new(TracingNotifier),
            Arc::new(SystemClock),
        );
        Ok::<_, Error>(check(&observer, &monitor).await)
    })??;

    println!("{}", report.render(&url));
    if report.health.state == ConnectionState::Online {
        Ok(())
    } else {
        Err(Error::BackendUnreachable {
            url,
            reason: format!("health probe left the link {}", report.health.state),
        })
    }
}

/// Runs both checks and disposes the observer.
pub async fn check(
    observer: &NetworkSignalObserver,
    monitor: &ConnectionHealthMonitor,
) -> CheckReport {
    let reachable = observer.check_connection().await;
    let health = monitor.force_check().await;
    observer.dispose();
    CheckReport { reachable, health }
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
