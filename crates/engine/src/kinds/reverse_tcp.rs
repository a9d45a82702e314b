// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `reverse_tcp` kind: drives the plain half of the TCP Forwarder (C4,
//! spec.md §4.4 paragraph 1).

use super::StartedHandle;
use crate::dataplane::tcp_forward::{bind_reverse_tcp, run_reverse_tcp, ReverseTcpConfig};
use crate::error::EngineError;
use tunnel_core::{Endpoint, Mode, SupervisorError, TunnelConfig};

/// Resolves the forwarding target: `remote_endpoint` if set, else
/// `args.target()` parsed as `host:port`, else (for `server` mode only) the
/// loopback default on the same port as the listener (spec.md §4.4).
pub fn resolve_target(cfg: &TunnelConfig) -> Result<Endpoint, EngineError> {
    if let Some(ep) = cfg.remote_endpoint {
        return Ok(ep);
    }
    if let Some(target) = cfg.args.target() {
        return target.parse().map_err(|_| {
            EngineError::Supervisor(SupervisorError::Validation {
                field: "args.target".into(),
                message: format!("{target:?} is not a valid host:port"),
            })
        });
    }
    if cfg.mode == Some(Mode::Server) {
        return Ok(Endpoint::loopback(cfg.listen_endpoint.port));
    }
    Err(EngineError::Supervisor(SupervisorError::Validation {
        field: "remote_endpoint".into(),
        message: "reverse_tcp requires remote_endpoint or args.target".into(),
    }))
}

pub async fn start(cfg: &TunnelConfig) -> Result<StartedHandle, EngineError> {
    let target = resolve_target(cfg)?.to_socket_addr();
    let listen = cfg.listen_endpoint.to_socket_addr();
    let listener = bind_reverse_tcp(listen).await?;
    let id = cfg.id;
    Ok(StartedHandle::spawn(move |cancel| async move {
        if let Err(e) = run_reverse_tcp(listener, ReverseTcpConfig { target }, cancel).await {
            tracing::error!(tunnel = ?id, error = %e, "reverse_tcp task exited with error");
        }
    }))
}

#[cfg(test)]
#[path = "reverse_tcp_tests.rs"]
mod tests;
