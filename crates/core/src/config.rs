// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TunnelConfig` and its kind-qualified enums (spec.md §3).

use crate::endpoint::Endpoint;
use crate::error::SupervisorError;
use crate::id::{RuntimeToken, TunnelId};
use crate::secret::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The seven tunnel kinds the supervisor knows how to drive (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelKind {
    ReverseTcp,
    Mtproto,
    UdpRaw,
    Gre,
    Tap,
    ChiselClient,
    ChiselServer,
}

impl TunnelKind {
    /// Kinds whose data plane runs in-process (spec.md §4.2 reconciliation).
    pub fn is_in_process(self) -> bool {
        matches!(self, Self::ReverseTcp | Self::Mtproto | Self::UdpRaw)
    }

    pub fn uses_child_process(self) -> bool {
        matches!(self, Self::ChiselClient | Self::ChiselServer)
    }

    pub fn uses_link_manager(self) -> bool {
        matches!(self, Self::Gre | Self::Tap)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReverseTcp => "reverse_tcp",
            Self::Mtproto => "mtproto",
            Self::UdpRaw => "udp_raw",
            Self::Gre => "gre",
            Self::Tap => "tap",
            Self::ChiselClient => "chisel_client",
            Self::ChiselServer => "chisel_server",
        }
    }
}

/// Kind-qualified mode (spec.md §3: `mode`). `udp_raw` uses the three
/// obfuscation modes; `reverse_tcp`/chisel kinds use client/server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    FakeTcp,
    Icmp,
    RawUdp,
    Client,
    Server,
}

/// `udp_raw`'s `role` field (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Server,
}

/// Authoritative intent plus best-effort current state (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelStatus {
    Stopped,
    Running,
}

/// Opaque mode-specific auxiliary options (spec.md §3: `args`). Modeled as a
/// flat string map, the same shape as the teacher's `JobConfig::vars`, with
/// typed accessors for the handful of keys each kind actually reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TunnelArgs(BTreeMap<String, String>);

impl TunnelArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// `udp_raw`'s outbound interface name (e.g. `eth0`), if pinned.
    pub fn interface(&self) -> Option<&str> {
        self.get("interface")
    }

    /// `udp_raw`'s VLAN id, if tagging is requested.
    pub fn vlan_id(&self) -> Option<u16> {
        self.get("vlan_id").and_then(|v| v.parse().ok())
    }

    /// Fallback `host:port` target for `reverse_tcp`/`mtproto` when
    /// `remote_endpoint` is unset (spec.md §4.4).
    pub fn target(&self) -> Option<&str> {
        self.get("target")
    }

    /// `gre`/`tap`'s OS interface name (spec.md §4.1 validation).
    pub fn iface_name(&self) -> Option<&str> {
        self.get("iface_name")
    }

    /// `gre`'s tunnel CIDR, e.g. `10.10.0.1/30` (spec.md §4.7).
    pub fn tunnel_cidr(&self) -> Option<&str> {
        self.get("tunnel_cidr")
    }

    /// `tap`'s assigned CIDR (spec.md §4.7).
    pub fn cidr(&self) -> Option<&str> {
        self.get("cidr")
    }

    /// `tap`'s MTU, defaulting to 1500 (spec.md §4.7).
    pub fn mtu(&self) -> u32 {
        self.get("mtu").and_then(|v| v.parse().ok()).unwrap_or(1500)
    }

    /// Chisel remote-forward specs, one per `remote` key
    /// (`remote.0`, `remote.1`, ...), e.g. `"3000:localhost:3000"`.
    pub fn chisel_remotes(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k.starts_with("remote."))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Path to the `chisel` binary, defaulting to `chisel` on `$PATH`.
    pub fn chisel_binary(&self) -> &str {
        self.get("chisel_binary").unwrap_or("chisel")
    }

    /// Path to the `ip` binary used by the Link Manager, defaulting to `ip`.
    pub fn ip_binary(&self) -> &str {
        self.get("ip_binary").unwrap_or("ip")
    }
}

/// One registered tunnel (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunnelConfig {
    pub id: TunnelId,
    pub name: String,
    pub kind: TunnelKind,
    pub listen_endpoint: Endpoint,
    pub remote_endpoint: Option<Endpoint>,
    pub mode: Option<Mode>,
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Secret>,
    #[serde(default)]
    pub dscp: u8,
    #[serde(default)]
    pub args: TunnelArgs,
    pub status: TunnelStatus,
    #[serde(default)]
    pub runtime_token: RuntimeToken,
}

/// Fields accepted by `tunnel.create` (no `id`/`status`/`runtime_token` —
/// those are assigned by the Config Store, spec.md §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTunnelConfig {
    pub name: String,
    pub kind: TunnelKind,
    pub listen_endpoint: Endpoint,
    pub remote_endpoint: Option<Endpoint>,
    pub mode: Option<Mode>,
    pub role: Option<Role>,
    pub secret: Option<Secret>,
    pub dscp: u8,
    pub args: TunnelArgs,
}

impl NewTunnelConfig {
    /// Structural validation independent of the rest of the registry
    /// (uniqueness of `name`/`id` is a Config Store concern, spec.md §4.1).
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.name.trim().is_empty() {
            return Err(SupervisorError::Validation {
                field: "name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.dscp > 63 {
            return Err(SupervisorError::Validation {
                field: "dscp".into(),
                message: format!("{} exceeds 6-bit range (0-63)", self.dscp),
            });
        }
        match self.kind {
            TunnelKind::UdpRaw => {
                let mode = self.mode.ok_or_else(|| SupervisorError::Validation {
                    field: "mode".into(),
                    message: "udp_raw requires mode in {faketcp, icmp, raw_udp}".into(),
                })?;
                if !matches!(mode, Mode::FakeTcp | Mode::Icmp | Mode::RawUdp) {
                    return Err(SupervisorError::Validation {
                        field: "mode".into(),
                        message: "udp_raw mode must be faketcp, icmp, or raw_udp".into(),
                    });
                }
                if self.role.is_none() {
                    return Err(SupervisorError::Validation {
                        field: "role".into(),
                        message: "udp_raw requires role in {client, server}".into(),
                    });
                }
                if self.role == Some(Role::Client) && self.remote_endpoint.is_none() {
                    return Err(SupervisorError::Validation {
                        field: "remote_endpoint".into(),
                        message: "udp_raw client requires a remote_endpoint".into(),
                    });
                }
            }
            TunnelKind::Mtproto => {
                let secret = self.secret.as_ref().ok_or_else(|| SupervisorError::Validation {
                    field: "secret".into(),
                    message: "mtproto requires a 32-byte secret".into(),
                })?;
                secret
                    .validate_mtproto()
                    .map_err(|e| SupervisorError::Validation {
                        field: "secret".into(),
                        message: e.to_string(),
                    })?;
            }
            TunnelKind::ChiselClient | TunnelKind::ChiselServer => {
                let mode = self.mode.ok_or_else(|| SupervisorError::Validation {
                    field: "mode".into(),
                    message: "chisel tunnels require mode in {client, server}".into(),
                })?;
                if !matches!(mode, Mode::Client | Mode::Server) {
                    return Err(SupervisorError::Validation {
                        field: "mode".into(),
                        message: "chisel mode must be client or server".into(),
                    });
                }
            }
            TunnelKind::Gre | TunnelKind::Tap => {
                if self.args.get("iface_name").is_none() {
                    return Err(SupervisorError::Validation {
                        field: "args.iface_name".into(),
                        message: "gre/tap require an iface_name".into(),
                    });
                }
            }
            TunnelKind::ReverseTcp => {}
        }
        Ok(())
    }
}

/// Fields accepted by `tunnel.update` (spec.md §4.3). Every field is
/// optional: only the ones present are changed, and `remote_endpoint`/
/// `secret` are double-`Option`-wrapped so a caller can distinguish "leave
/// unchanged" from "set to `None`".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunnelPatch {
    #[serde(default)]
    pub listen_endpoint: Option<Endpoint>,
    #[serde(default)]
    pub remote_endpoint: Option<Option<Endpoint>>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub secret: Option<Option<Secret>>,
    #[serde(default)]
    pub dscp: Option<u8>,
    #[serde(default)]
    pub args: Option<TunnelArgs>,
}

impl TunnelPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural validation on the fields actually present; duplicated
    /// ranges from [`NewTunnelConfig::validate`] since the store applies a
    /// patch without re-deriving a full config first.
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if let Some(dscp) = self.dscp {
            if dscp > 63 {
                return Err(SupervisorError::Validation {
                    field: "dscp".into(),
                    message: format!("{dscp} exceeds 6-bit range (0-63)"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
