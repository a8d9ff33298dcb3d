// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

pub fn agent() -> Command {
    cargo_bin_cmd!("kiosk-agent")
}

/// A temp directory holding `agent.toml` that keeps all state inside it.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_extra("")
    }

    pub fn demo() -> Self {
        Self::with_extra("demo_mode = true\n")
    }

    /// `extra` is appended to the generated config verbatim.
    pub fn with_extra(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "api_base = \"http://127.0.0.1:9/api\"\ndatabase_path = \"{}\"\n{}",
            dir.path().join("pending.db").display(),
            extra
        );
        std::fs::write(dir.path().join("agent.toml"), config).unwrap();
        Workspace { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("agent.toml")
    }

    /// `kiosk-agent --config <this workspace> <args>`.
    pub fn agent(&self, args: &[&str]) -> Command {
        let mut cmd = agent();
        cmd.arg("--config").arg(self.config_path()).args(args);
        cmd
    }
}

/// Polls `cond` until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
