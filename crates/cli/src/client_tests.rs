// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for daemon client behavior.

use super::{ClientError, DaemonClient};
use crate::daemon_process::{cleanup_stale_socket, daemon_dir, probe_socket};
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

/// Regression test: connect() must not delete state files when the daemon
/// is mid-startup (pid file written, socket not bound yet).
#[test]
#[serial]
fn connect_does_not_delete_pid_file() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("TUNNELD_STATE_DIR", state_dir.path());

    let dir = daemon_dir().unwrap();
    fs::create_dir_all(&dir).unwrap();
    let pid_path = dir.join("daemon.pid");
    fs::write(&pid_path, "12345\n").unwrap();

    let result = DaemonClient::connect();
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));

    assert!(pid_path.exists(), "connect() must not delete pid file");

    std::env::remove_var("TUNNELD_STATE_DIR");
}

/// Simulates a crashed daemon: socket file exists, PID file references a
/// dead process. cleanup_stale_socket should remove both files.
#[test]
#[serial]
fn stale_socket_is_cleaned_up() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("TUNNELD_STATE_DIR", state_dir.path());

    let socket_path = state_dir.path().join("daemon.sock");
    fs::write(&socket_path, "").unwrap();

    let mut child = std::process::Command::new("true").spawn().unwrap();
    let dead_pid = child.id();
    child.wait().unwrap();

    let pid_path = state_dir.path().join("daemon.pid");
    fs::write(&pid_path, format!("{}\n", dead_pid)).unwrap();

    assert!(!probe_socket(&socket_path));

    cleanup_stale_socket().unwrap();

    assert!(!socket_path.exists(), "stale socket should be removed");
    assert!(!pid_path.exists(), "stale PID file should be removed");

    std::env::remove_var("TUNNELD_STATE_DIR");
}

/// If the socket file exists but there's no PID file at all, the socket is
/// definitely stale (daemon can't be running without a PID file).
#[test]
#[serial]
fn stale_socket_with_no_pid_file_is_cleaned_up() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("TUNNELD_STATE_DIR", state_dir.path());

    let socket_path = state_dir.path().join("daemon.sock");
    fs::write(&socket_path, "").unwrap();

    let pid_path = state_dir.path().join("daemon.pid");
    assert!(!pid_path.exists());

    assert!(!probe_socket(&socket_path));

    cleanup_stale_socket().unwrap();

    assert!(!socket_path.exists(), "stale socket should be removed");

    std::env::remove_var("TUNNELD_STATE_DIR");
}

/// connect() with no socket and no pid file at all is just DaemonNotRunning.
#[test]
#[serial]
fn connect_with_empty_state_dir_reports_not_running() {
    let state_dir = tempdir().unwrap();
    std::env::set_var("TUNNELD_STATE_DIR", state_dir.path());

    let result = DaemonClient::connect();
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));

    std::env::remove_var("TUNNELD_STATE_DIR");
}
