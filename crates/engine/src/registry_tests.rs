// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicBool;
use tunnel_core::TunnelKind;

/// Stands in for `Driver::spawn_reaper` (which these tests don't exercise):
/// a task awaiting `join` and forwarding completion over `done_tx`, exactly
/// as the driver's reaper does.
fn spawn_handle(registry_notice: Arc<AtomicBool>) -> RunningHandle {
    let cancel = Arc::new(Notify::new());
    let terminated = Arc::new(AtomicBool::new(false));
    let task_cancel = cancel.clone();
    let join = tokio::spawn(async move {
        task_cancel.notified().await;
        registry_notice.store(true, Ordering::SeqCst);
    });
    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = join.await;
        let _ = done_tx.send(());
    });
    RunningHandle::new(TunnelKind::ReverseTcp, cancel, terminated, done_rx)
}

#[tokio::test]
async fn attach_then_is_live_then_stop_clears_it() {
    let registry = Registry::new();
    let id = TunnelId(1);
    let ran = Arc::new(AtomicBool::new(false));

    registry.attach(id, spawn_handle(ran.clone())).unwrap();
    assert!(registry.is_live(id));

    registry.stop(id).await;
    assert!(!registry.is_live(id));
    assert!(ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn attach_twice_is_already_running() {
    let registry = Registry::new();
    let id = TunnelId(2);
    let ran = Arc::new(AtomicBool::new(false));
    registry.attach(id, spawn_handle(ran.clone())).unwrap();

    let err = registry.attach(id, spawn_handle(ran));
    assert!(matches!(err, Err(SupervisorError::AlreadyRunning(_))));
}

#[tokio::test]
async fn stop_on_absent_id_is_a_harmless_noop() {
    let registry = Registry::new();
    registry.stop(TunnelId(99)).await;
    assert!(!registry.is_live(TunnelId(99)));
}

#[tokio::test]
async fn stop_all_drains_every_handle() {
    let registry = Registry::new();
    let ran_a = Arc::new(AtomicBool::new(false));
    let ran_b = Arc::new(AtomicBool::new(false));
    registry.attach(TunnelId(1), spawn_handle(ran_a.clone())).unwrap();
    registry.attach(TunnelId(2), spawn_handle(ran_b.clone())).unwrap();

    registry.stop_all().await;

    assert!(registry.list_ids().is_empty());
    assert!(ran_a.load(Ordering::SeqCst));
    assert!(ran_b.load(Ordering::SeqCst));
}
