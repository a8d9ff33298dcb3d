// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    file_not_found = { Error::FileNotFound("f-1".into()), "f-1" },
    invalid_status = { Error::InvalidSyncStatus("bogus".into()), "pending, syncing, synced, error" },
    invalid_payload = { Error::InvalidPayload("not an object".into()), "not an object" },
    transition = {
        Error::InvalidTransition { from: "synced".into(), to: "pending".into() },
        "synced to pending"
    },
)]
fn error_display_contains(err: Error, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn io_error_converts() {
    let io = std::io::Error::other("disk gone");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("disk gone"));
}
