// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `chisel_client`/`chisel_server` kinds: drives the `chisel` binary as a
//! supervised child process (C6, spec.md §4.6).

use super::StartedHandle;
use crate::error::EngineError;
use std::time::Duration;
use tunnel_adapters::ProcessAdapter;
use tunnel_core::{SupervisorError, TunnelConfig, TunnelKind};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn build_args(cfg: &TunnelConfig) -> Result<Vec<String>, EngineError> {
    match cfg.kind {
        TunnelKind::ChiselServer => Ok(vec![
            "server".into(),
            "--port".into(),
            cfg.listen_endpoint.port.to_string(),
        ]),
        TunnelKind::ChiselClient => {
            let server = cfg.remote_endpoint.ok_or_else(|| {
                EngineError::Supervisor(SupervisorError::Validation {
                    field: "remote_endpoint".into(),
                    message: "chisel_client requires a remote_endpoint naming the chisel server".into(),
                })
            })?;
            let mut args = vec!["client".into(), server.to_string()];
            args.extend(cfg.args.chisel_remotes().into_iter().map(String::from));
            Ok(args)
        }
        other => unreachable!("kinds::chisel invoked for non-chisel kind {other:?}"),
    }
}

pub async fn start<P: ProcessAdapter>(cfg: &TunnelConfig, process: &P) -> Result<StartedHandle, EngineError> {
    let binary = cfg.args.chisel_binary().to_string();
    let args = build_args(cfg)?;
    let handle = process.spawn(&cfg.name, &binary, &args, &[]).await?;

    let process = process.clone();
    let id = cfg.id;
    Ok(StartedHandle::spawn(move |cancel| async move {
        loop {
            tokio::select! {
                _ = cancel.notified() => {
                    if let Err(e) = process.kill(&handle).await {
                        tracing::warn!(tunnel = ?id, error = %e, "failed to kill chisel process");
                    }
                    return;
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {
                    match process.is_alive(&handle).await {
                        Ok(true) => continue,
                        Ok(false) => {
                            tracing::info!(tunnel = ?id, "chisel process exited on its own");
                            return;
                        }
                        Err(e) => {
                            tracing::warn!(tunnel = ?id, error = %e, "lost track of chisel process");
                            return;
                        }
                    }
                }
            }
        }
    }))
}

#[cfg(test)]
#[path = "chisel_tests.rs"]
mod tests;
