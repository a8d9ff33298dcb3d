// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence for [`AutoSyncConfig`].

use std::fs;
use std::path::{Path, PathBuf};

use kiosk_core::AutoSyncConfig;

use crate::config::ConfigError;

/// Durable home of the auto-sync settings.
pub trait ConfigRepository: Send + Sync {
    /// The stored settings, or the defaults when nothing is stored yet.
    fn load(&self) -> Result<AutoSyncConfig, ConfigError>;

    fn save(&self, config: &AutoSyncConfig) -> Result<(), ConfigError>;
}

/// Stores the settings as a small TOML file.
#[derive(Debug, Clone)]
pub struct TomlConfigRepository {
    path: PathBuf,
}

impl TomlConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TomlConfigRepository { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigRepository for TomlConfigRepository {
    fn load(&self) -> Result<AutoSyncConfig, ConfigError> {
        let path = self.path.display().to_string();
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AutoSyncConfig::default());
            }
            Err(e) => return Err(ConfigError::Read { path, reason: e.to_string() }),
        };
        let config: AutoSyncConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse { path, reason: e.to_string() })?;
        Ok(config.normalized())
    }

    fn save(&self, config: &AutoSyncConfig) -> Result<(), ConfigError> {
        let write_err = |reason: String| ConfigError::Write {
            path: self.path.display().to_string(),
            reason,
        };
        let content = toml::to_string_pretty(config).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
            }
        }
        // Write-then-rename so a crash never leaves half a file
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content).map_err(|e| write_err(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| write_err(e.to_string()))
    }
}
