// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `udp_raw` kind: wires a `TunnelConfig` into the Raw-Socket Engine's
//! client or server path depending on `role` (C5, spec.md §4.5).

use super::StartedHandle;
use crate::dataplane::raw_socket::client::{self, ClientConfig};
use crate::dataplane::raw_socket::packet::RawMode;
use crate::dataplane::raw_socket::server::{self, ServerConfig};
use crate::error::EngineError;
use std::net::{Ipv4Addr, SocketAddrV4};
use tunnel_core::{Mode, Role, SupervisorError, TunnelConfig};

fn raw_mode_of(mode: Mode) -> Result<RawMode, EngineError> {
    match mode {
        Mode::FakeTcp => Ok(RawMode::FakeTcp),
        Mode::Icmp => Ok(RawMode::Icmp),
        Mode::RawUdp => Ok(RawMode::RawUdp),
        Mode::Client | Mode::Server => Err(EngineError::Supervisor(SupervisorError::Validation {
            field: "mode".into(),
            message: "udp_raw mode must be faketcp, icmp, or raw_udp".into(),
        })),
    }
}

fn to_ipv4(addr: std::net::IpAddr, field: &str) -> Result<Ipv4Addr, EngineError> {
    match addr {
        std::net::IpAddr::V4(v4) => Ok(v4),
        std::net::IpAddr::V6(_) => Err(EngineError::Supervisor(SupervisorError::Validation {
            field: field.into(),
            message: "the raw-socket engine only supports IPv4".into(),
        })),
    }
}

fn missing(field: &str, message: &str) -> EngineError {
    EngineError::Supervisor(SupervisorError::Validation {
        field: field.into(),
        message: message.into(),
    })
}

pub async fn start(cfg: &TunnelConfig) -> Result<StartedHandle, EngineError> {
    let mode = raw_mode_of(cfg.mode.ok_or_else(|| missing("mode", "udp_raw requires mode"))?)?;
    let role = cfg.role.ok_or_else(|| missing("role", "udp_raw requires role"))?;
    let id = cfg.id;

    match role {
        Role::Client => {
            let dst_ep = cfg
                .remote_endpoint
                .ok_or_else(|| missing("remote_endpoint", "udp_raw client requires a remote_endpoint"))?;
            let dst = SocketAddrV4::new(to_ipv4(dst_ep.address, "remote_endpoint")?, dst_ep.port);
            let client_cfg = ClientConfig {
                listen_port: cfg.listen_endpoint.port,
                dst,
                dscp: cfg.dscp,
                mode,
            };
            let prepared = client::prepare(&client_cfg).await?;
            Ok(StartedHandle::spawn(move |cancel| async move {
                if let Err(e) = client::run(prepared, client_cfg, cancel).await {
                    tracing::error!(tunnel = ?id, error = %e, "udp_raw client task exited with error");
                }
            }))
        }
        Role::Server => {
            let forward_ep = cfg
                .remote_endpoint
                .ok_or_else(|| missing("remote_endpoint", "udp_raw server requires a remote_endpoint to forward to"))?;
            let forward_to = SocketAddrV4::new(to_ipv4(forward_ep.address, "remote_endpoint")?, forward_ep.port);
            let server_cfg = ServerConfig {
                listen_port: cfg.listen_endpoint.port,
                forward_to,
                dscp: cfg.dscp,
                mode,
            };
            let prepared = server::prepare(&server_cfg).await?;
            Ok(StartedHandle::spawn(move |cancel| async move {
                if let Err(e) = server::run(prepared, server_cfg, cancel).await {
                    tracing::error!(tunnel = ?id, error = %e, "udp_raw server task exited with error");
                }
            }))
        }
    }
}

#[cfg(test)]
#[path = "udp_raw_tests.rs"]
mod tests;
