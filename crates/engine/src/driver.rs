// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle Driver (C3, spec.md §4.3): the only caller authorized to
//! install/remove [`crate::registry::Registry`] entries and to persist
//! `status` transitions. Dispatches Start/Stop/Reconcile per kind through
//! the [`crate::kinds`] tables rather than one polymorphic trait.

use crate::error::EngineError;
use crate::kinds::{self, StartedHandle};
use crate::registry::{Registry, RunningHandle};
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tunnel_adapters::{LinkAdapter, ProcessAdapter};
use tunnel_core::config::NewTunnelConfig;
use tunnel_core::{SupervisorError, TunnelConfig, TunnelId, TunnelKind, TunnelPatch, TunnelStatus};
use tunnel_storage::ConfigStore;

/// Drives tunnel lifecycle transitions against a [`ConfigStore`] and
/// [`Registry`], generic over the process/link adapters so the real OS
/// integration and the fakes share one code path.
pub struct Driver<P, L> {
    store: Arc<ConfigStore>,
    registry: Arc<Registry>,
    process: P,
    link: L,
    /// Per-id serialization for Start/Stop (spec.md §4.3's ordering
    /// guarantee), mirroring the teacher's `agent_owners: Mutex<HashMap<...>>`
    /// keyed-lock idiom.
    locks: SyncMutex<HashMap<TunnelId, Arc<AsyncMutex<()>>>>,
}

impl<P, L> Driver<P, L>
where
    P: ProcessAdapter,
    L: LinkAdapter,
{
    pub fn new(store: Arc<ConfigStore>, registry: Arc<Registry>, process: P, link: L) -> Self {
        Self {
            store,
            registry,
            process,
            link,
            locks: SyncMutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn id_lock(&self, id: TunnelId) -> Arc<AsyncMutex<()>> {
        self.locks.lock().entry(id).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    pub fn create(&self, new: NewTunnelConfig) -> Result<TunnelConfig, SupervisorError> {
        self.store.create(new)
    }

    pub fn update(&self, id: TunnelId, patch: TunnelPatch) -> Result<TunnelConfig, SupervisorError> {
        self.store.update(id, patch)
    }

    /// `tunnel.start` (spec.md §4.3). Not idempotent: a running tunnel fails
    /// with [`SupervisorError::AlreadyRunning`]. Setup failures unwind fully:
    /// no handle installed, no persisted `running`.
    pub async fn start(&self, id: TunnelId) -> Result<TunnelConfig, EngineError> {
        let lock = self.id_lock(id);
        let _guard = lock.lock().await;

        let cfg = self.store.get(id).ok_or(SupervisorError::NotFound(id))?;
        if cfg.status == TunnelStatus::Running {
            return Err(SupervisorError::AlreadyRunning(id).into());
        }

        let handle = self.start_kind(&cfg).await?;
        if let StartedHandle::Task { cancel, terminated, join } = handle {
            let (done_tx, done_rx) = tokio::sync::oneshot::channel();
            self.registry.attach(id, RunningHandle::new(cfg.kind, cancel, terminated.clone(), done_rx))?;
            self.spawn_reaper(id, terminated, join, done_tx);
        }

        self.store.set_status(id, TunnelStatus::Running)?;
        #[allow(clippy::expect_used)]
        Ok(self.store.get(id).expect("tunnel just started is present"))
    }

    /// Watches a data-plane task's [`tokio::task::JoinHandle`] to completion
    /// and runs the termination hook (spec.md §3, §4.3, §4.4) when the task
    /// exits on its own rather than through an explicit `stop()`. The
    /// once-guard (`terminated`) is consulted so an explicit `Stop` racing
    /// the same exit always wins: `RunningHandle::stop` sets it before
    /// signaling cancellation, so if it already fired this reaper only
    /// forwards the exit signal and skips the registry/store mutation.
    fn spawn_reaper(&self, id: TunnelId, terminated: Arc<AtomicBool>, join: tokio::task::JoinHandle<()>, done_tx: tokio::sync::oneshot::Sender<()>) {
        let store = self.store.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let _ = join.await;
            let _ = done_tx.send(());

            if terminated.swap(true, Ordering::SeqCst) {
                return;
            }

            tracing::info!(tunnel_id = %id, "data-plane task exited on its own, running termination hook");
            registry.detach(id);
            if let Err(e) = store.set_status(id, TunnelStatus::Stopped) {
                tracing::warn!(tunnel_id = %id, error = %e, "failed to persist status=stopped after self-exit");
            }
        });
    }

    /// `tunnel.stop`. Idempotent: stopping an already-stopped (or unknown
    /// after a prior delete) tunnel is not an error.
    pub async fn stop(&self, id: TunnelId) -> Result<(), EngineError> {
        let lock = self.id_lock(id);
        let _guard = lock.lock().await;

        let Some(cfg) = self.store.get(id) else {
            return Ok(());
        };

        if cfg.kind.uses_link_manager() {
            self.stop_link_kind(&cfg).await?;
        } else {
            self.registry.stop(id).await;
        }

        match self.store.set_status(id, TunnelStatus::Stopped) {
            Ok(()) | Err(SupervisorError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `tunnel.delete`: Stop then remove, atomic from the caller's view.
    pub async fn delete(&self, id: TunnelId) -> Result<(), EngineError> {
        self.stop(id).await?;
        self.locks.lock().remove(&id);
        self.store.delete(id).map_err(EngineError::from)
    }

    async fn start_kind(&self, cfg: &TunnelConfig) -> Result<StartedHandle, EngineError> {
        match cfg.kind {
            TunnelKind::ReverseTcp => kinds::reverse_tcp::start(cfg).await,
            TunnelKind::Mtproto => kinds::mtproto::start(cfg).await,
            TunnelKind::UdpRaw => kinds::udp_raw::start(cfg).await,
            TunnelKind::Gre => kinds::gre::start(cfg, &self.link).await,
            TunnelKind::Tap => kinds::tap::start(cfg, &self.link).await,
            TunnelKind::ChiselClient | TunnelKind::ChiselServer => kinds::chisel::start(cfg, &self.process).await,
        }
    }

    async fn stop_link_kind(&self, cfg: &TunnelConfig) -> Result<(), EngineError> {
        match cfg.kind {
            TunnelKind::Gre => kinds::gre::stop(cfg, &self.link).await,
            TunnelKind::Tap => kinds::tap::stop(cfg, &self.link).await,
            other => unreachable!("stop_link_kind invoked for non-link kind {other:?}"),
        }
    }

    /// Boot-time reconciliation entry point for `gre`/`tap` (spec.md §4.2);
    /// `reconcile.rs` calls this rather than duplicating the per-kind match.
    pub async fn reconcile_link_kind(&self, cfg: &TunnelConfig) -> Result<bool, EngineError> {
        match cfg.kind {
            TunnelKind::Gre => kinds::gre::reconcile(cfg, &self.link).await,
            TunnelKind::Tap => kinds::tap::reconcile(cfg, &self.link).await,
            other => unreachable!("reconcile_link_kind invoked for non-link kind {other:?}"),
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
