// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mtproto` kind: the embedded Telegram MTProto relay (C4, spec.md §4.4
//! paragraph 2). See SPEC_FULL.md §6 for the authenticity decision: the
//! handshake is accepted unconditionally in this tier.

use super::StartedHandle;
use crate::dataplane::tcp_forward::{bind_mtproto, run_mtproto, MtprotoConfig};
use crate::error::EngineError;
use tunnel_core::{SupervisorError, TunnelConfig};

pub async fn start(cfg: &TunnelConfig) -> Result<StartedHandle, EngineError> {
    let dc_target = cfg
        .remote_endpoint
        .ok_or_else(|| {
            EngineError::Supervisor(SupervisorError::Validation {
                field: "remote_endpoint".into(),
                message: "mtproto requires a remote_endpoint naming the Telegram DC to relay to".into(),
            })
        })?
        .to_socket_addr();
    let listen = cfg.listen_endpoint.to_socket_addr();
    let listener = bind_mtproto(listen).await?;
    let id = cfg.id;
    Ok(StartedHandle::spawn(move |cancel| async move {
        if let Err(e) = run_mtproto(listener, MtprotoConfig { dc_target }, cancel).await {
            tracing::error!(tunnel = ?id, error = %e, "mtproto task exited with error");
        }
    }))
}

#[cfg(test)]
#[path = "mtproto_tests.rs"]
mod tests;
