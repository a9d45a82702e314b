// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor Registry (C2, spec.md §4.2): the in-memory `{id -> RunningHandle}`
//! map. Nothing outside this module may mutate a `RunningHandle`.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tunnel_core::{SupervisorError, TunnelId, TunnelKind};

/// Per-handle grace period the registry waits for a cancelled task to
/// acknowledge before considering `Stop` complete (spec.md §5).
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// A live, in-process or child-process tunnel handle. Owns the cancellation
/// signal; the data-plane task/goroutine equivalent owns the actual
/// resources (sockets, child process) and is solely responsible for closing
/// them once it observes cancellation. The driver's reaper task (not this
/// struct) owns the actual `JoinHandle`, since it must keep watching the
/// task even when no `Stop` ever arrives (a data-plane self-exit).
pub struct RunningHandle {
    pub kind: TunnelKind,
    cancel: Arc<Notify>,
    /// Flipped once the termination hook has run for this handle, so the
    /// hook is guaranteed to execute exactly once even under a Stop race
    /// (spec.md §9 "once-guard"). Shared with the driver's reaper task.
    terminated: Arc<AtomicBool>,
    /// Resolves once the driver's reaper has observed the data-plane task
    /// actually exit.
    done: tokio::sync::oneshot::Receiver<()>,
}

impl RunningHandle {
    pub fn new(
        kind: TunnelKind,
        cancel: Arc<Notify>,
        terminated: Arc<AtomicBool>,
        done: tokio::sync::oneshot::Receiver<()>,
    ) -> Self {
        Self {
            kind,
            cancel,
            terminated,
            done,
        }
    }

    /// Signals cancellation and waits up to [`STOP_GRACE`] for the task to
    /// exit. Sets the once-guard before signaling cancel, so a reaper
    /// racing the same exit sees it already claimed and skips the
    /// self-exit termination hook (spec.md §9 "once-guard").
    async fn stop(self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.cancel.notify_waiters();
        let outcome = tokio::time::timeout(STOP_GRACE, self.done).await;
        if outcome.is_err() {
            tracing::warn!("data-plane task did not exit within grace period, aborting");
        }
    }
}

#[derive(Default)]
struct Inner {
    handles: HashMap<TunnelId, RunningHandle>,
}

/// Guards the `{id -> RunningHandle}` map with one mutex. Held only for map
/// mutation; data-plane I/O never runs under this lock (spec.md §5).
#[derive(Default)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handle` for `id`. Fails if a handle is already present
    /// (invariant I2: at most one live handle per id).
    pub fn attach(&self, id: TunnelId, handle: RunningHandle) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock();
        if inner.handles.contains_key(&id) {
            return Err(SupervisorError::AlreadyRunning(id));
        }
        inner.handles.insert(id, handle);
        Ok(())
    }

    /// Removes and returns the handle for `id`, if present. No-op if absent.
    pub(crate) fn detach(&self, id: TunnelId) -> Option<RunningHandle> {
        self.inner.lock().handles.remove(&id)
    }

    pub fn is_live(&self, id: TunnelId) -> bool {
        self.inner.lock().handles.contains_key(&id)
    }

    pub fn list_ids(&self) -> Vec<TunnelId> {
        self.inner.lock().handles.keys().copied().collect()
    }

    /// Detaches and stops the handle for `id`, if any. Idempotent: stopping
    /// an id with no live handle succeeds trivially (spec.md §4.3, P3).
    pub async fn stop(&self, id: TunnelId) {
        if let Some(handle) = self.detach(id) {
            handle.stop().await;
        }
    }

    /// Drains the map, cancelling every handle. Order across ids is
    /// unspecified (spec.md §4.2).
    pub async fn stop_all(&self) {
        let handles: Vec<RunningHandle> = {
            let mut inner = self.inner.lock();
            inner.handles.drain().map(|(_, h)| h).collect()
        };
        let stops = handles.into_iter().map(RunningHandle::stop);
        futures_lite_join_all(stops).await;
    }
}

/// Minimal `join_all` so the engine doesn't need a `futures`/`futures-util`
/// dependency for this one call site.
async fn futures_lite_join_all<F: std::future::Future<Output = ()>>(futs: impl Iterator<Item = F>) {
    let handles: Vec<_> = futs.map(tokio::spawn).collect();
    for h in handles {
        let _ = h.await;
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
