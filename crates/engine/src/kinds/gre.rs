// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gre` kind: a thin synchronous wrapper over the Link Manager (C7,
//! spec.md §4.7). No cancellable task is ever attached for this kind; the
//! interface either exists on the host or it doesn't.

use super::StartedHandle;
use crate::error::EngineError;
use tunnel_adapters::LinkAdapter;
use tunnel_core::{SupervisorError, TunnelConfig};

fn required_field<'a>(cfg: &'a TunnelConfig, get: impl Fn(&'a TunnelConfig) -> Option<&'a str>, field: &str) -> Result<&'a str, EngineError> {
    get(cfg).ok_or_else(|| {
        EngineError::Supervisor(SupervisorError::Validation {
            field: field.into(),
            message: format!("gre requires {field}"),
        })
    })
}

pub async fn start<L: LinkAdapter>(cfg: &TunnelConfig, link: &L) -> Result<StartedHandle, EngineError> {
    let iface = required_field(cfg, |c| c.args.iface_name(), "args.iface_name")?;
    let cidr = required_field(cfg, |c| c.args.tunnel_cidr(), "args.tunnel_cidr")?;
    let remote = cfg
        .remote_endpoint
        .ok_or_else(|| EngineError::Supervisor(SupervisorError::Validation {
            field: "remote_endpoint".into(),
            message: "gre requires a remote_endpoint".into(),
        }))?;
    link.create_gre(iface, cfg.listen_endpoint.address, remote.address, cidr).await?;
    Ok(StartedHandle::Synchronous)
}

pub async fn stop<L: LinkAdapter>(cfg: &TunnelConfig, link: &L) -> Result<(), EngineError> {
    let iface = required_field(cfg, |c| c.args.iface_name(), "args.iface_name")?;
    link.destroy(iface).await?;
    Ok(())
}

/// Boot-time reconciliation: verify the OS interface is still present
/// rather than re-creating it (spec.md §4.2 — avoids clobbering an
/// operator's manual teardown).
pub async fn reconcile<L: LinkAdapter>(cfg: &TunnelConfig, link: &L) -> Result<bool, EngineError> {
    let iface = required_field(cfg, |c| c.args.iface_name(), "args.iface_name")?;
    Ok(link.exists(iface).await?)
}

#[cfg(test)]
#[path = "gre_tests.rs"]
mod tests;
