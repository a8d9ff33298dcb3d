// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration management.
//!
//! Configuration is read from a TOML file (default
//! `~/.config/kiosk-agent/config.toml`). Every field has a default, so a
//! missing file yields a working local setup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "kiosk-agent";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "pending_sync.db";
const AUTO_SYNC_FILE_NAME: &str = "auto_sync.toml";

/// Errors reading, writing or interpreting configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("failed to write config {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("invalid URL '{0}': expected http://, https://, ws:// or wss://")]
    InvalidUrl(String),
}

/// Agent configuration stored in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Base URL of the backend API (e.g. `http://kiosk.local:3000/api`).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Serve synthetic data and never touch the network.
    #[serde(default)]
    pub demo_mode: bool,
    /// Prefer the push channel for status snapshots.
    #[serde(default = "default_use_websocket")]
    pub use_websocket: bool,
    /// Pull interval for status polling, in milliseconds.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    /// Delay before the first health probe, in milliseconds.
    #[serde(default = "default_health_initial_delay_ms")]
    pub health_initial_delay_ms: u64,
    /// Health probe cadence while the link is up, in milliseconds.
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// Ceiling for the failure backoff, in milliseconds.
    #[serde(default = "default_health_max_backoff_ms")]
    pub health_max_backoff_ms: u64,
    /// Use the failure backoff as the probe cadence while the link is down.
    /// When false the cadence stays at `health_check_interval_ms`.
    #[serde(default = "default_health_apply_backoff")]
    pub health_apply_backoff: bool,
    /// Path of the pending-file database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Path of the persisted auto-sync settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_sync_path: Option<PathBuf>,
    /// `host:port` watched for OS-level link changes. Derived from `api_base` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reachability_target: Option<String>,
    /// How often the link watcher re-checks the target, in milliseconds.
    #[serde(default = "default_link_poll_interval_ms")]
    pub link_poll_interval_ms: u64,
    /// Endpoint receiving batch pushes. Defaults to `{api_base}/sync/push`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_endpoint: Option<String>,
    /// Directory that relative pending-file paths resolve against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_root: Option<PathBuf>,
}

fn default_api_base() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_use_websocket() -> bool {
    true
}

fn default_polling_interval_ms() -> u64 {
    5_000
}

fn default_health_initial_delay_ms() -> u64 {
    2_000
}

fn default_health_check_interval_ms() -> u64 {
    30_000
}

fn default_health_max_backoff_ms() -> u64 {
    60_000
}

fn default_health_apply_backoff() -> bool {
    true
}

fn default_link_poll_interval_ms() -> u64 {
    5_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            api_base: default_api_base(),
            demo_mode: false,
            use_websocket: default_use_websocket(),
            polling_interval_ms: default_polling_interval_ms(),
            health_initial_delay_ms: default_health_initial_delay_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            health_max_backoff_ms: default_health_max_backoff_ms(),
            health_apply_backoff: default_health_apply_backoff(),
            database_path: None,
            auto_sync_path: None,
            reachability_target: None,
            link_poll_interval_ms: default_link_poll_interval_ms(),
            push_endpoint: None,
            content_root: None,
        }
    }
}

impl AgentConfig {
    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Loads configuration from `path`, or the defaults if the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(AgentConfig::default());
        }
        Self::load(path)
    }

    /// Saves configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: path.display().to_string(),
            reason,
        };
        let content = toml::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        fs::write(path, content).map_err(|e| write_err(e.to_string()))
    }

    /// `GET` target of the health probe.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.api_base.trim_end_matches('/'))
    }

    /// `GET` target of the status poll.
    pub fn status_url(&self) -> String {
        format!("{}/status", self.api_base.trim_end_matches('/'))
    }

    /// Push channel URL derived from `api_base`.
    pub fn channel_url(&self) -> Result<String, ConfigError> {
        derive_channel_url(&self.api_base)
    }

    /// Batch push endpoint.
    pub fn push_url(&self) -> String {
        self.push_endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/sync/push", self.api_base.trim_end_matches('/')))
    }

    /// Root for relative `file_path`s in the pending queue; the working
    /// directory when unset.
    pub fn content_root(&self) -> PathBuf {
        self.content_root.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Address watched by the link-signal source.
    pub fn reachability_target(&self) -> Result<String, ConfigError> {
        match &self.reachability_target {
            Some(target) => Ok(target.clone()),
            None => authority_with_port(&self.api_base),
        }
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms.max(1))
    }

    pub fn link_poll_interval(&self) -> Duration {
        Duration::from_millis(self.link_poll_interval_ms.max(1))
    }

    /// Resolved path of the pending-file database.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir().join(DB_FILE_NAME))
    }

    /// Resolved path of the auto-sync settings file.
    pub fn auto_sync_path(&self) -> PathBuf {
        self.auto_sync_path.clone().unwrap_or_else(|| {
            self.database_path()
                .parent()
                .map(|p| p.join(AUTO_SYNC_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(AUTO_SYNC_FILE_NAME))
        })
    }
}

/// Default location of `config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn split_url(url: &str) -> Result<(&str, &str, &str), ConfigError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| ConfigError::InvalidUrl(url.to_string()))?;
    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    if authority.is_empty() {
        return Err(ConfigError::InvalidUrl(url.to_string()));
    }
    Ok((scheme, authority, path))
}

/// Rewrites `http→ws` / `https→wss` and the `/api` segment to `/ws/status`.
///
/// Without an `/api` segment, `/ws/status` is appended to the path.
pub fn derive_channel_url(api_base: &str) -> Result<String, ConfigError> {
    let (scheme, authority, path) = split_url(api_base.trim_end_matches('/'))?;
    let ws_scheme = match scheme {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(ConfigError::InvalidUrl(api_base.to_string())),
    };

    let mut segments = Vec::new();
    let mut replaced = false;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !replaced && segment == "api" {
            segments.extend(["ws", "status"]);
            replaced = true;
        } else {
            segments.push(segment);
        }
    }
    if !replaced {
        segments.extend(["ws", "status"]);
    }

    Ok(format!("{}://{}/{}", ws_scheme, authority, segments.join("/")))
}

/// `host:port` of a URL, filling in the scheme's default port.
fn authority_with_port(url: &str) -> Result<String, ConfigError> {
    let (scheme, authority, _) = split_url(url)?;
    // strip userinfo
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let has_port = match host_port.rfind(':') {
        Some(i) => !host_port[i..].contains(']'),
        None => false,
    };
    if has_port {
        return Ok(host_port.to_string());
    }
    let port = match scheme {
        "https" | "wss" => 443,
        "http" | "ws" => 80,
        _ => return Err(ConfigError::InvalidUrl(url.to_string())),
    };
    Ok(format!("{}:{}", host_port, port))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
