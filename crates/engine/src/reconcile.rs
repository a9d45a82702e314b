// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boot-time reconciliation (C2, spec.md §4.2): for every persisted row with
//! `status = running`, decide whether to re-attempt Start, verify an OS
//! resource is still present, or simply mark it `stopped`. Runs once, before
//! the daemon starts accepting commands.

use crate::driver::Driver;
use crate::error::EngineError;
use tunnel_adapters::{LinkAdapter, ProcessAdapter};
use tunnel_core::{TunnelKind, TunnelStatus};

/// Walks every persisted tunnel and reconciles `status = running` rows
/// against what can actually be true immediately after a restart (no
/// in-process task or child process survives the daemon's own exit).
pub async fn reconcile<P, L>(driver: &Driver<P, L>) -> Result<(), EngineError>
where
    P: ProcessAdapter,
    L: LinkAdapter,
{
    for cfg in driver.store().list() {
        if cfg.status != TunnelStatus::Running {
            continue;
        }

        match cfg.kind {
            TunnelKind::ReverseTcp | TunnelKind::Mtproto | TunnelKind::UdpRaw => {
                // No handle survives a restart; the runtime_token on this
                // row is already zero (it is never persisted non-zero, see
                // DESIGN.md), so clearing it is a no-op here. Drop to
                // `stopped` first so Start's not-already-running
                // precondition is satisfiable, then retry it.
                driver.store().set_status(cfg.id, TunnelStatus::Stopped)?;
                if let Err(e) = driver.start(cfg.id).await {
                    tracing::warn!(tunnel = ?cfg.id, error = %e, "reconcile: restart failed, leaving stopped");
                }
            }
            TunnelKind::ChiselClient if cfg.remote_endpoint.is_some() => {
                driver.store().set_status(cfg.id, TunnelStatus::Stopped)?;
                if let Err(e) = driver.start(cfg.id).await {
                    tracing::warn!(tunnel = ?cfg.id, error = %e, "reconcile: chisel_client restart failed, leaving stopped");
                }
            }
            TunnelKind::Gre | TunnelKind::Tap => {
                let present = driver.reconcile_link_kind(&cfg).await?;
                if !present {
                    tracing::info!(tunnel = ?cfg.id, "reconcile: interface gone, marking stopped");
                    driver.store().set_status(cfg.id, TunnelStatus::Stopped)?;
                }
            }
            // chisel_server, and chisel_client with no remote_endpoint to
            // reconnect to: the old PID is meaningless after a restart.
            TunnelKind::ChiselClient | TunnelKind::ChiselServer => {
                driver.store().set_status(cfg.id, TunnelStatus::Stopped)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
