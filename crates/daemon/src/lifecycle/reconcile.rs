// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper around [`tunnel_engine::reconcile::reconcile`] run during
//! startup, before the socket is bound (spec.md §4.2: reconciliation
//! happens once, before the daemon accepts commands — unlike the teacher's
//! job reconciliation, which is deferred to a background task so the daemon
//! stays responsive while long-running agent recovery proceeds).

use super::{LifecycleError, TunnelDriver};
use tracing::info;

pub(crate) async fn reconcile_at_startup(driver: &TunnelDriver) -> Result<(), LifecycleError> {
    let start = std::time::Instant::now();
    tunnel_engine::reconcile::reconcile(driver).await?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "boot-time reconciliation complete");
    Ok(())
}
