// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn fails_with<E>(e: E) -> Result<()>
where
    Error: From<E>,
{
    let failed: std::result::Result<(), E> = Err(e);
    failed?;
    Ok(())
}

#[test]
fn backend_unreachable_carries_hint() {
    let err = Error::BackendUnreachable {
        url: "http://kiosk.local/api/health".into(),
        reason: "timed out".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("http://kiosk.local/api/health"));
    assert!(msg.contains("hint:"));
    assert!(msg.contains("api_base"));
}

#[test]
fn sync_failed_reports_count_and_reason() {
    let err = Error::SyncFailed { files: 3, message: "HTTP 409".into() };
    assert_eq!(err.to_string(), "sync of 3 file(s) failed: HTTP 409");
}

#[test]
fn component_errors_convert_with_question_mark() {
    assert!(matches!(fails_with(ProbeError::Status(503)), Err(Error::Probe(_))));
    assert!(matches!(fails_with(TransportError::ConnectionClosed), Err(Error::Transport(_))));
    assert!(matches!(
        fails_with(ConfigError::InvalidUrl("ftp://x".into())),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        fails_with(kiosk_core::Error::FileNotFound("f1".into())),
        Err(Error::Core(_))
    ));
    assert!(matches!(
        fails_with(StoreError::Core(kiosk_core::Error::CorruptedData("x".into()))),
        Err(Error::Store(_))
    ));
}

#[test]
fn push_errors_keep_their_own_message() {
    let err: Error = PushError::Rejected("HTTP 500".into()).into();
    assert_eq!(err.to_string(), "remote rejected batch: HTTP 500");
}

#[test]
fn core_errors_are_transparent() {
    let err: Error = kiosk_core::Error::FileNotFound("f1".into()).into();
    assert_eq!(err.to_string(), "pending file not found: f1");
}
