// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication (spec.md §6 Command API).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

use serde::{Deserialize, Serialize};
use tunnel_core::config::{NewTunnelConfig, TunnelPatch};
use tunnel_core::{Endpoint, TunnelConfig, TunnelId, TunnelKind, TunnelStatus};

#[path = "protocol_wire.rs"]
pub mod wire;
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon. One request per connection (spec.md §6: the
/// Command API is a synchronous call/response surface, unlike the event bus
/// the teacher's job daemon exposes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// `tunnel.create`
    Create { config: NewTunnelConfig },

    /// `tunnel.start`
    Start { id: TunnelId },

    /// `tunnel.stop`
    Stop { id: TunnelId },

    /// `tunnel.update`
    Update { id: TunnelId, patch: TunnelPatch },

    /// `tunnel.delete`
    Delete { id: TunnelId },

    /// `tunnel.list`
    List {
        #[serde(default)]
        kind: Option<TunnelKind>,
    },

    /// `tunnel.get`
    Get { id: TunnelId },

    /// Request daemon shutdown
    Shutdown,
}

impl Request {
    /// The string-keyed command name (spec.md §6's `tunnel.*` surface),
    /// used for logging and for `ErrUnknownAction` diagnostics at the CLI.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Hello { .. } => "hello",
            Self::Create { .. } => "tunnel.create",
            Self::Start { .. } => "tunnel.start",
            Self::Stop { .. } => "tunnel.stop",
            Self::Update { .. } => "tunnel.update",
            Self::Delete { .. } => "tunnel.delete",
            Self::List { .. } => "tunnel.list",
            Self::Get { .. } => "tunnel.get",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic acknowledgement (`tunnel.start`/`stop`/`update`/`delete`)
    Ack,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// `tunnel.create`/`tunnel.get` result
    Tunnel { tunnel: TunnelConfig },

    /// `tunnel.list` result
    List { tunnels: Vec<TunnelSummary> },

    /// Error response. `code` is [`tunnel_core::SupervisorError::code`]'s
    /// machine-readable tag (spec.md §7).
    Error { code: String, message: String },
}

/// One row of `tunnel.list`'s result (spec.md §6: "array of {id, name, kind,
/// status, endpoints}").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TunnelSummary {
    pub id: TunnelId,
    pub name: String,
    pub kind: TunnelKind,
    pub status: TunnelStatus,
    pub listen_endpoint: Endpoint,
    pub remote_endpoint: Option<Endpoint>,
}

impl From<&TunnelConfig> for TunnelSummary {
    fn from(cfg: &TunnelConfig) -> Self {
        Self {
            id: cfg.id,
            name: cfg.name.clone(),
            kind: cfg.kind,
            status: cfg.status,
            listen_endpoint: cfg.listen_endpoint,
            remote_endpoint: cfg.remote_endpoint,
        }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
