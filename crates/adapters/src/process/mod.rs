// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process management (C6: `chisel_client`/`chisel_server`, spec.md §5).

mod child;
mod noop;

pub use child::SpawnedProcessAdapter;
pub use noop::NoOpProcessAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessAdapter, ProcessCall};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Opaque handle to a spawned process, returned by `spawn` and passed back
/// into every other call. Not a raw pid: the real adapter may track
/// additional bookkeeping (stdout drain task, etc.) keyed by this id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessHandle(pub String);

impl std::fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Adapter for spawning and supervising a long-running child process, the
/// way the Tunnel Engine drives `chisel client ...`/`chisel server ...`.
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Spawns `cmd args...` with the given extra environment variables.
    async fn spawn(
        &self,
        name: &str,
        cmd: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<ProcessHandle, ProcessError>;

    /// Sends a graceful termination signal (`SIGTERM`), falling back to
    /// `SIGKILL` if the process has not exited after the adapter's own
    /// grace period.
    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError>;

    async fn is_alive(&self, handle: &ProcessHandle) -> Result<bool, ProcessError>;

    /// The process's exit code, or `None` while it is still running.
    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError>;
}
