// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Status feed types.
//!
//! A [`StatusSnapshot`] is opaque telemetry: this crate never looks inside it
//! beyond checking that it is a JSON object with at least one field.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One status payload, replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StatusSnapshot(Map<String, Value>);

impl StatusSnapshot {
    /// Wraps an already-parsed JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        StatusSnapshot(fields)
    }

    /// Parses a frame or response body. Anything but a JSON object is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(StatusSnapshot(fields)),
            other => Err(Error::InvalidPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Synthetic payload served in demo mode.
    pub fn demo() -> Self {
        let mut fields = Map::new();
        fields.insert("cpu".into(), Value::from(12.5));
        fields.insert("memory".into(), Value::from(41.0));
        fields.insert("volume".into(), Value::from(60));
        fields.insert("muted".into(), Value::from(false));
        fields.insert("playing".into(), Value::from(true));
        fields.insert("track".into(), Value::from(3));
        StatusSnapshot(fields)
    }

    /// True when the payload carries nothing usable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Borrows all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Provenance of the status currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusSource {
    /// Synthetic demo data.
    Demo,
    /// Push channel.
    Websocket,
    /// Periodic pull, no push channel configured.
    Polling,
    /// Periodic pull because the configured push channel is erroring.
    PollingFallback,
}

impl StatusSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSource::Demo => "demo",
            StatusSource::Websocket => "websocket",
            StatusSource::Polling => "polling",
            StatusSource::PollingFallback => "polling-fallback",
        }
    }
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display classification derived from the active source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    Loading,
    Error,
    Empty,
    Success,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Loading => "loading",
            UiState::Error => "error",
            UiState::Empty => "empty",
            UiState::Success => "success",
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The unified status feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusView {
    pub connection_type: StatusSource,
    pub ui_state: UiState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StatusSnapshot>,
    /// Set when the shown poll result is older than the freshness window.
    #[serde(default)]
    pub stale: bool,
    /// Message of the last failed pull, when the UI state is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusView {
    /// The instant view served in demo mode.
    pub fn demo() -> Self {
        StatusView {
            connection_type: StatusSource::Demo,
            ui_state: UiState::Success,
            snapshot: Some(StatusSnapshot::demo()),
            stale: false,
            error: None,
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
