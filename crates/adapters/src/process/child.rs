// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `ProcessAdapter`, spawning and supervising an OS child process.

use super::{ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;

const KILL_GRACE: Duration = Duration::from_secs(5);

struct Tracked {
    child: Child,
}

/// Spawns real child processes via `tokio::process::Command`, tracking each
/// by the handle id returned from `spawn` (mirroring how the teacher's
/// `TmuxAdapter` hands back a session id rather than a raw pid).
#[derive(Clone, Default)]
pub struct SpawnedProcessAdapter {
    children: Arc<Mutex<HashMap<String, Tracked>>>,
}

impl SpawnedProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessAdapter for SpawnedProcessAdapter {
    async fn spawn(
        &self,
        name: &str,
        cmd: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<ProcessHandle, ProcessError> {
        let mut command = tokio::process::Command::new(cmd);
        command
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let child = command
            .spawn()
            .map_err(|e| ProcessError::SpawnFailed(e.to_string()))?;

        let pid = child.id().unwrap_or(0);
        let handle = ProcessHandle(format!("{name}-{pid}"));
        self.children
            .lock()
            .insert(handle.0.clone(), Tracked { child });

        tracing::info!(handle = %handle, cmd, pid, "process spawned");
        Ok(handle)
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let pid = {
            let mut children = self.children.lock();
            let tracked = children
                .get_mut(&handle.0)
                .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;
            tracked.child.id()
        };

        if let Some(pid) = pid {
            let nix_pid = Pid::from_raw(pid as i32);
            if let Err(e) = signal::kill(nix_pid, Signal::SIGTERM) {
                tracing::warn!(handle = %handle, error = %e, "SIGTERM failed, will force-kill");
            }
        }

        let exited = tokio::time::timeout(KILL_GRACE, self.wait_exit(handle)).await;
        if exited.is_err() {
            let mut children = self.children.lock();
            if let Some(tracked) = children.get_mut(&handle.0) {
                let _ = tracked.child.start_kill();
            }
        }

        Ok(())
    }

    async fn is_alive(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        let mut children = self.children.lock();
        let tracked = children
            .get_mut(&handle.0)
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;
        Ok(tracked
            .child
            .try_wait()
            .map_err(|e| ProcessError::CommandFailed(e.to_string()))?
            .is_none())
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        let mut children = self.children.lock();
        let tracked = children
            .get_mut(&handle.0)
            .ok_or_else(|| ProcessError::NotFound(handle.to_string()))?;
        let status = tracked
            .child
            .try_wait()
            .map_err(|e| ProcessError::CommandFailed(e.to_string()))?;
        Ok(status.and_then(|s| s.code()))
    }
}

impl SpawnedProcessAdapter {
    async fn wait_exit(&self, handle: &ProcessHandle) {
        loop {
            let done = {
                let mut children = self.children.lock();
                match children.get_mut(&handle.0) {
                    Some(tracked) => matches!(tracked.child.try_wait(), Ok(Some(_))),
                    None => true,
                }
            };
            if done {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

#[cfg(test)]
#[path = "child_tests.rs"]
mod tests;
