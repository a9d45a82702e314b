// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tap` kind: same synchronous Link Manager shape as [`super::gre`], with
//! TAP's `cidr`/`mtu` fields instead of GRE's tunnel endpoints.

use super::StartedHandle;
use crate::error::EngineError;
use tunnel_adapters::LinkAdapter;
use tunnel_core::{SupervisorError, TunnelConfig};

fn required_field<'a>(cfg: &'a TunnelConfig, get: impl Fn(&'a TunnelConfig) -> Option<&'a str>, field: &str) -> Result<&'a str, EngineError> {
    get(cfg).ok_or_else(|| {
        EngineError::Supervisor(SupervisorError::Validation {
            field: field.into(),
            message: format!("tap requires {field}"),
        })
    })
}

pub async fn start<L: LinkAdapter>(cfg: &TunnelConfig, link: &L) -> Result<StartedHandle, EngineError> {
    let iface = required_field(cfg, |c| c.args.iface_name(), "args.iface_name")?;
    let cidr = required_field(cfg, |c| c.args.cidr(), "args.cidr")?;
    link.create_tap(iface, cidr, cfg.args.mtu()).await?;
    Ok(StartedHandle::Synchronous)
}

pub async fn stop<L: LinkAdapter>(cfg: &TunnelConfig, link: &L) -> Result<(), EngineError> {
    let iface = required_field(cfg, |c| c.args.iface_name(), "args.iface_name")?;
    link.destroy(iface).await?;
    Ok(())
}

pub async fn reconcile<L: LinkAdapter>(cfg: &TunnelConfig, link: &L) -> Result<bool, EngineError> {
    let iface = required_field(cfg, |c| c.args.iface_name(), "args.iface_name")?;
    Ok(link.exists(iface).await?)
}

#[cfg(test)]
#[path = "tap_tests.rs"]
mod tests;
