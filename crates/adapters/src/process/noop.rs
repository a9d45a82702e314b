// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op process adapter, used when a deployment disables the External
//! Process Manager kinds entirely.

use super::{ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpProcessAdapter;

impl NoOpProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessAdapter for NoOpProcessAdapter {
    async fn spawn(
        &self,
        _name: &str,
        _cmd: &str,
        _args: &[String],
        _env: &[(String, String)],
    ) -> Result<ProcessHandle, ProcessError> {
        Ok(ProcessHandle("noop".into()))
    }

    async fn kill(&self, _handle: &ProcessHandle) -> Result<(), ProcessError> {
        Ok(())
    }

    async fn is_alive(&self, _handle: &ProcessHandle) -> Result<bool, ProcessError> {
        Ok(false)
    }

    async fn exit_code(&self, _handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
