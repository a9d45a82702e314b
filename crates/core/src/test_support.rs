// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and fixtures shared by this crate's own tests and by every
//! downstream crate's test suite. Gated behind the `test-support` feature so
//! it never ships in release builds, mirroring the teacher's split between
//! production code and its `builders` test module.

use crate::config::{Mode, NewTunnelConfig, Role, TunnelArgs, TunnelConfig, TunnelKind, TunnelStatus};
use crate::endpoint::Endpoint;
use crate::id::{RuntimeToken, TunnelId};
use crate::secret::Secret;

/// Builds a valid `NewTunnelConfig`, defaulting to `reverse_tcp`, which
/// needs no kind-specific fields. Call `.kind(...)` plus whatever fields
/// that kind requires before `.build()`.
pub struct NewTunnelConfigBuilder {
    name: String,
    kind: TunnelKind,
    listen_endpoint: Endpoint,
    remote_endpoint: Option<Endpoint>,
    mode: Option<Mode>,
    role: Option<Role>,
    secret: Option<Secret>,
    dscp: u8,
    args: TunnelArgs,
}

impl Default for NewTunnelConfigBuilder {
    fn default() -> Self {
        Self {
            name: "test-tunnel".into(),
            kind: TunnelKind::ReverseTcp,
            listen_endpoint: Endpoint::loopback(18080),
            remote_endpoint: None,
            mode: None,
            role: None,
            secret: None,
            dscp: 0,
            args: TunnelArgs::new(),
        }
    }
}

impl NewTunnelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn kind(mut self, kind: TunnelKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn listen_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.listen_endpoint = endpoint;
        self
    }

    pub fn remote_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.remote_endpoint = Some(endpoint);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn secret(mut self, secret: Secret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn dscp(mut self, dscp: u8) -> Self {
        self.dscp = dscp;
        self
    }

    pub fn args(mut self, args: TunnelArgs) -> Self {
        self.args = args;
        self
    }

    pub fn build(self) -> NewTunnelConfig {
        NewTunnelConfig {
            name: self.name,
            kind: self.kind,
            listen_endpoint: self.listen_endpoint,
            remote_endpoint: self.remote_endpoint,
            mode: self.mode,
            role: self.role,
            secret: self.secret,
            dscp: self.dscp,
            args: self.args,
        }
    }
}

/// A fully materialized `TunnelConfig` fixture, bypassing the Config Store,
/// for tests that only need a value shaped like one (e.g. reconciler tests).
pub fn fixture_tunnel(id: u64, kind: TunnelKind) -> TunnelConfig {
    let new = NewTunnelConfigBuilder::new().kind(kind).build();
    TunnelConfig {
        id: TunnelId(id),
        name: new.name,
        kind: new.kind,
        listen_endpoint: new.listen_endpoint,
        remote_endpoint: new.remote_endpoint,
        mode: new.mode,
        role: new.role,
        secret: new.secret,
        dscp: new.dscp,
        args: new.args,
        status: TunnelStatus::Stopped,
        runtime_token: RuntimeToken::NONE,
    }
}
