// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_startup_error_finds_errors_after_latest_marker() {
    let log = format!(
        "{}1) ---\nERROR: Failed to start daemon: bind failed\n",
        STARTUP_MARKER_PREFIX
    );
    let err = parse_startup_error(&log).unwrap();
    assert!(err.contains("bind failed"));
}

#[test]
fn parse_startup_error_ignores_lines_before_the_most_recent_marker() {
    let log = format!(
        "{}1) ---\nERROR: old failure\n{}2) ---\nDaemon started\n",
        STARTUP_MARKER_PREFIX, STARTUP_MARKER_PREFIX
    );
    assert_eq!(parse_startup_error(&log), None);
}

#[test]
fn parse_startup_error_returns_none_with_no_marker() {
    assert_eq!(parse_startup_error("some unrelated log line\n"), None);
}
