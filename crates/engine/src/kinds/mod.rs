// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-kind Start/Stop/Reconcile behavior (C3, spec.md §9's redesign note: a
//! closed tagged variant over kind with a dispatch table of
//! validator/starter/stopper/reconciler, rather than one polymorphic
//! interface every kind must awkwardly implement).

pub mod chisel;
pub mod gre;
pub mod mtproto;
pub mod reverse_tcp;
pub mod tap;
pub mod udp_raw;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// What `kinds::*::start` hands back to the driver for installation in the
/// registry. `Synchronous` kinds (gre/tap) have no cancellable task: the
/// link-manager call already completed by the time `start` returns, so
/// there is nothing for the registry to own beyond the status transition.
pub enum StartedHandle {
    Task {
        cancel: Arc<Notify>,
        terminated: Arc<AtomicBool>,
        join: JoinHandle<()>,
    },
    Synchronous,
}

impl StartedHandle {
    /// Builds a cancel signal, spawns `make_fut(cancel)`, and wraps the
    /// result. Every in-process/child-process kind's `start` goes through
    /// this so the cancel handle it installs in the registry is exactly the
    /// one its task is actually watching.
    pub fn spawn<F, Fut>(make_fut: F) -> Self
    where
        F: FnOnce(Arc<Notify>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let cancel = Arc::new(Notify::new());
        let terminated = Arc::new(AtomicBool::new(false));
        let join = tokio::spawn(make_fut(cancel.clone()));
        StartedHandle::Task { cancel, terminated, join }
    }
}
