// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each with exactly one request/response round trip per spec.md §6's
//! Command API (unlike the teacher's persistent event-bus connections).

use std::sync::Arc;

use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::lifecycle::TunnelDriver;
use crate::protocol::{self, Request, Response, TunnelSummary, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
use tunnel_core::SupervisorError;

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub driver: Arc<TunnelDriver>,
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}

impl Listener {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the listener loop until the process exits, spawning a task per
    /// connection so a slow or stuck client never blocks another.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Protocol(protocol::ProtocolError::ConnectionClosed) => {
                                    debug!("client disconnected");
                                }
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!("connection timeout");
                                }
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;
    tracing::info!(command = request.command_name(), "received request");

    let response = handle_request(request, ctx).await;
    debug!(?response, "sending response");

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

/// Handle a single request and return a response. Infallible: every
/// `SupervisorError`/`EngineError` is mapped to `Response::Error` rather
/// than propagated, per spec.md §7 ("any command returns either success or
/// exactly one error").
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello { version: PROTOCOL_VERSION.to_string() },

        Request::Create { config } => match ctx.driver.create(config) {
            Ok(tunnel) => Response::Tunnel { tunnel },
            Err(e) => error_response(e),
        },

        Request::Start { id } => match ctx.driver.start(id).await {
            Ok(_tunnel) => Response::Ack,
            Err(e) => error_response(e.into()),
        },

        Request::Stop { id } => match ctx.driver.stop(id).await {
            Ok(()) => Response::Ack,
            Err(e) => error_response(e.into()),
        },

        Request::Update { id, patch } => match ctx.driver.update(id, patch) {
            Ok(_tunnel) => Response::Ack,
            Err(e) => error_response(e),
        },

        Request::Delete { id } => match ctx.driver.delete(id).await {
            Ok(()) => Response::Ack,
            Err(e) => error_response(e.into()),
        },

        Request::List { kind } => {
            let tunnels: Vec<TunnelSummary> = ctx
                .driver
                .store()
                .list()
                .iter()
                .filter(|cfg| kind.map_or(true, |k| cfg.kind == k))
                .map(TunnelSummary::from)
                .collect();
            Response::List { tunnels }
        }

        Request::Get { id } => match ctx.driver.store().get(id) {
            Some(tunnel) => Response::Tunnel { tunnel },
            None => error_response(SupervisorError::NotFound(id)),
        },

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

fn error_response(e: SupervisorError) -> Response {
    Response::Error { code: e.code().to_string(), message: e.to_string() }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
