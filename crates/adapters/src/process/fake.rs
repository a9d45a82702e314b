// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for deterministic engine tests.

use super::{ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum ProcessCall {
    Spawn {
        name: String,
        cmd: String,
        args: Vec<String>,
        env: Vec<(String, String)>,
    },
    Kill { handle: String },
    IsAlive { handle: String },
}

#[derive(Debug, Clone)]
struct FakeProcess {
    alive: bool,
    exit_code: Option<i32>,
}

struct State {
    processes: HashMap<String, FakeProcess>,
    calls: Vec<ProcessCall>,
    next_id: u64,
}

/// Fake process adapter: every `spawn` succeeds and is tracked in memory.
/// Tests drive exit via [`Self::set_exited`].
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                processes: HashMap::new(),
                calls: Vec::new(),
                next_id: 0,
            })),
        }
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_exited(&self, handle: &ProcessHandle, exit_code: i32) {
        if let Some(p) = self.inner.lock().processes.get_mut(&handle.0) {
            p.alive = false;
            p.exit_code = Some(exit_code);
        }
    }

    pub fn is_tracked(&self, handle: &ProcessHandle) -> bool {
        self.inner.lock().processes.contains_key(&handle.0)
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(
        &self,
        name: &str,
        cmd: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<ProcessHandle, ProcessError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let handle = ProcessHandle(format!("fake-{}", inner.next_id));

        inner.calls.push(ProcessCall::Spawn {
            name: name.to_string(),
            cmd: cmd.to_string(),
            args: args.to_vec(),
            env: env.to_vec(),
        });
        inner.processes.insert(
            handle.0.clone(),
            FakeProcess {
                alive: true,
                exit_code: None,
            },
        );
        Ok(handle)
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Kill {
            handle: handle.0.clone(),
        });
        if let Some(p) = inner.processes.get_mut(&handle.0) {
            p.alive = false;
            p.exit_code.get_or_insert(143);
        }
        Ok(())
    }

    async fn is_alive(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::IsAlive {
            handle: handle.0.clone(),
        });
        match inner.processes.get(&handle.0) {
            Some(p) => Ok(p.alive),
            None => Err(ProcessError::NotFound(handle.to_string())),
        }
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        let inner = self.inner.lock();
        match inner.processes.get(&handle.0) {
            Some(p) => Ok(p.exit_code),
            None => Err(ProcessError::NotFound(handle.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
