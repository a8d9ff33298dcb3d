// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;
use yare::parameterized;

#[parameterized(
    plain = { "http://localhost:3000/api", "ws://localhost:3000/ws/status" },
    trailing_slash = { "http://localhost:3000/api/", "ws://localhost:3000/ws/status" },
    tls = { "https://kiosk.example.com/api", "wss://kiosk.example.com/ws/status" },
    nested = { "http://10.0.0.5:8080/api/v1", "ws://10.0.0.5:8080/ws/status/v1" },
    no_api_segment = { "http://kiosk.local", "ws://kiosk.local/ws/status" },
    prefix_before_api = { "http://kiosk.local/admin/api", "ws://kiosk.local/admin/ws/status" },
    apiary_is_not_api = { "http://kiosk.local/apiary", "ws://kiosk.local/apiary/ws/status" },
)]
fn derives_channel_url(api_base: &str, expected: &str) {
    assert_eq!(derive_channel_url(api_base).unwrap(), expected);
}

#[parameterized(
    no_scheme = { "localhost:3000/api" },
    ftp = { "ftp://files.local/api" },
    empty_host = { "http:///api" },
)]
fn rejects_unusable_urls(api_base: &str) {
    assert!(matches!(derive_channel_url(api_base), Err(ConfigError::InvalidUrl(_))));
}

#[test]
fn defaults_match_documented_values() {
    let config = AgentConfig::default();
    assert_eq!(config.api_base, "http://localhost:3000/api");
    assert!(!config.demo_mode);
    assert!(config.use_websocket);
    assert_eq!(config.health_initial_delay_ms, 2_000);
    assert_eq!(config.health_check_interval_ms, 30_000);
    assert_eq!(config.health_max_backoff_ms, 60_000);
}

#[test]
fn derived_http_endpoints() {
    let config = AgentConfig { api_base: "http://kiosk.local/api/".into(), ..AgentConfig::default() };
    assert_eq!(config.health_url(), "http://kiosk.local/api/health");
    assert_eq!(config.status_url(), "http://kiosk.local/api/status");
    assert_eq!(config.push_url(), "http://kiosk.local/api/sync/push");
}

#[parameterized(
    explicit_port = { "http://kiosk.local:3000/api", "kiosk.local:3000" },
    http_default = { "http://kiosk.local/api", "kiosk.local:80" },
    https_default = { "https://kiosk.local/api", "kiosk.local:443" },
    userinfo = { "http://admin@kiosk.local:81/api", "kiosk.local:81" },
)]
fn reachability_target_from_api_base(api_base: &str, expected: &str) {
    let config = AgentConfig { api_base: api_base.into(), ..AgentConfig::default() };
    assert_eq!(config.reachability_target().unwrap(), expected);
}

#[test]
fn explicit_reachability_target_wins() {
    let config = AgentConfig {
        reachability_target: Some("1.1.1.1:53".into()),
        ..AgentConfig::default()
    };
    assert_eq!(config.reachability_target().unwrap(), "1.1.1.1:53");
}

#[test]
fn partial_file_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_base = \"http://box:9000/api\"\ndemo_mode = true\n").unwrap();

    let config = AgentConfig::load(&path).unwrap();
    assert_eq!(config.api_base, "http://box:9000/api");
    assert!(config.demo_mode);
    assert_eq!(config.polling_interval_ms, 5_000);
}

#[test]
fn save_then_load_preserves_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = AgentConfig {
        polling_interval_ms: 1234,
        database_path: Some(dir.path().join("db.sqlite")),
        ..AgentConfig::default()
    };
    config.save(&path).unwrap();

    let loaded = AgentConfig::load(&path).unwrap();
    assert_eq!(loaded.polling_interval_ms, 1234);
    assert_eq!(loaded.database_path(), dir.path().join("db.sqlite"));
    assert_eq!(loaded.auto_sync_path(), dir.path().join("auto_sync.toml"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let config = AgentConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.api_base, AgentConfig::default().api_base);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_base = [").unwrap();
    assert!(matches!(AgentConfig::load(&path), Err(ConfigError::Parse { .. })));
}

#[test]
fn content_root_defaults_to_working_directory() {
    assert_eq!(AgentConfig::default().content_root(), PathBuf::from("."));

    let config = AgentConfig {
        content_root: Some(PathBuf::from("/srv/kiosk")),
        push_endpoint: Some("https://git.local/push".into()),
        ..AgentConfig::default()
    };
    assert_eq!(config.content_root(), PathBuf::from("/srv/kiosk"));
    assert_eq!(config.push_url(), "https://git.local/push");
}
