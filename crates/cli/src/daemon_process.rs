// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Functions for starting, stopping, and monitoring the `tunneld` process.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::client::ClientError;

/// Start the daemon in the background, returning the child process handle.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let tunneld_path = find_tunneld_binary();

    Command::new(&tunneld_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon synchronously using SIGTERM + polling, falling back to
/// SIGKILL. Used for version-mismatch restarts where we're in a sync
/// context inside a tokio runtime.
pub fn stop_daemon_sync() {
    if let Ok(Some(pid)) = read_daemon_pid() {
        kill_signal("-15", pid);

        let start = Instant::now();
        let timeout = crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(2));
        while start.elapsed() < timeout {
            if !process_exists(pid) {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        if process_exists(pid) {
            kill_signal("-9", pid);
        }
    }

    if let Ok(dir) = daemon_dir() {
        let pid_path = dir.join("daemon.pid");
        if pid_path.exists() {
            let _ = std::fs::remove_file(&pid_path);
        }
    }
}

/// Locate the `tunneld` binary: explicit override, sibling of the debug
/// build of this CLI, sibling of the current executable, or `$PATH`.
fn find_tunneld_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Some(manifest_dir) = crate::env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/tunneld"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return path;
                }
            }
        }
    }

    if let Some(ref exe) = current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("tunneld");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("tunneld")
}

pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.sock"))
}

pub fn daemon_dir() -> Result<PathBuf, ClientError> {
    crate::env::state_dir()
}

pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let pid_path = daemon_dir()?.join("daemon.pid");
    if !pid_path.exists() {
        return Ok(None);
    }
    match std::fs::read_to_string(&pid_path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(_) => Ok(None),
    }
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

const STARTUP_MARKER_PREFIX: &str = "--- tunneld: starting (pid: ";

/// Read `daemon.log` from its most recent startup marker, looking for
/// errors emitted before the process exited.
pub fn read_startup_error() -> Option<String> {
    let dir = daemon_dir().ok()?;
    let content = std::fs::read_to_string(dir.join("daemon.log")).ok()?;
    parse_startup_error(&content)
}

fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains("ERROR") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    let messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Wrap an error with startup log detail, if any is available.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    match read_startup_error() {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove a stale socket/PID pair left behind by a crashed daemon.
pub fn cleanup_stale_socket() -> Result<(), ClientError> {
    let dir = daemon_dir()?;
    let socket_path = dir.join("daemon.sock");
    let pid_path = dir.join("daemon.pid");

    let stale = match read_daemon_pid() {
        Ok(Some(pid)) => !process_exists(pid),
        Ok(None) => true,
        Err(_) => true,
    };

    if stale {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
    }

    Ok(())
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
