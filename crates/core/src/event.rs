// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL event log (spec.md §4.3). The Config Store never mutates
//! `ConfigState` directly; it appends an `Event`, then applies it, mirroring
//! `oj_core::event::Event`'s flat enum-of-structs shape.

use crate::config::{Mode, NewTunnelConfig, Role, TunnelArgs, TunnelStatus};
use crate::endpoint::Endpoint;
use crate::id::TunnelId;
use crate::secret::Secret;
use serde::{Deserialize, Serialize};

/// One durable fact appended to the WAL. Replaying the full event log from
/// an empty `ConfigState` must reproduce the exact same state (spec.md §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TunnelCreated {
        id: TunnelId,
        name: String,
        kind: crate::config::TunnelKind,
        listen_endpoint: Endpoint,
        remote_endpoint: Option<Endpoint>,
        mode: Option<Mode>,
        role: Option<Role>,
        secret: Option<Secret>,
        dscp: u8,
        args: TunnelArgs,
    },
    TunnelUpdated {
        id: TunnelId,
        listen_endpoint: Option<Endpoint>,
        remote_endpoint: Option<Option<Endpoint>>,
        mode: Option<Mode>,
        role: Option<Role>,
        secret: Option<Option<Secret>>,
        dscp: Option<u8>,
        args: Option<TunnelArgs>,
    },
    TunnelStatusChanged {
        id: TunnelId,
        status: TunnelStatus,
    },
    TunnelDeleted {
        id: TunnelId,
    },
}

impl Event {
    pub fn created(id: TunnelId, new: &NewTunnelConfig) -> Self {
        Event::TunnelCreated {
            id,
            name: new.name.clone(),
            kind: new.kind,
            listen_endpoint: new.listen_endpoint,
            remote_endpoint: new.remote_endpoint,
            mode: new.mode,
            role: new.role,
            secret: new.secret.clone(),
            dscp: new.dscp,
            args: new.args.clone(),
        }
    }

    pub fn tunnel_id(&self) -> TunnelId {
        match self {
            Event::TunnelCreated { id, .. }
            | Event::TunnelUpdated { id, .. }
            | Event::TunnelStatusChanged { id, .. }
            | Event::TunnelDeleted { id, .. } => *id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
