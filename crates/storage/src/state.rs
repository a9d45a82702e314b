// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived by replaying the WAL's `Event`s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tunnel_core::{Event, TunnelConfig, TunnelId, TunnelStatus};

/// The full set of registered tunnels, keyed by id, plus a name index for
/// `tunnel.create`'s uniqueness check (spec.md §3 invariant I1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigState {
    pub tunnels: BTreeMap<TunnelId, TunnelConfig>,
    #[serde(default)]
    name_index: BTreeMap<String, TunnelId>,
}

impl ConfigState {
    pub fn get(&self, id: TunnelId) -> Option<&TunnelConfig> {
        self.tunnels.get(&id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TunnelConfig> {
        self.name_index.get(name).and_then(|id| self.tunnels.get(id))
    }

    pub fn name_taken(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TunnelConfig> {
        self.tunnels.values()
    }

    /// Applies an `Event` to derive the next state. Every handler must be
    /// idempotent: applying the same event twice (once for immediate
    /// visibility, once during WAL replay on boot) must leave state
    /// unchanged the second time.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::TunnelCreated {
                id,
                name,
                kind,
                listen_endpoint,
                remote_endpoint,
                mode,
                role,
                secret,
                dscp,
                args,
            } => {
                if self.tunnels.contains_key(id) {
                    return;
                }
                self.name_index.insert(name.clone(), *id);
                self.tunnels.insert(
                    *id,
                    TunnelConfig {
                        id: *id,
                        name: name.clone(),
                        kind: *kind,
                        listen_endpoint: *listen_endpoint,
                        remote_endpoint: *remote_endpoint,
                        mode: *mode,
                        role: *role,
                        secret: secret.clone(),
                        dscp: *dscp,
                        args: args.clone(),
                        status: TunnelStatus::Stopped,
                        runtime_token: Default::default(),
                    },
                );
            }
            Event::TunnelUpdated {
                id,
                listen_endpoint,
                remote_endpoint,
                mode,
                role,
                secret,
                dscp,
                args,
            } => {
                if let Some(tunnel) = self.tunnels.get_mut(id) {
                    if let Some(ep) = listen_endpoint {
                        tunnel.listen_endpoint = *ep;
                    }
                    if let Some(ep) = remote_endpoint {
                        tunnel.remote_endpoint = *ep;
                    }
                    if let Some(m) = mode {
                        tunnel.mode = Some(*m);
                    }
                    if let Some(r) = role {
                        tunnel.role = Some(*r);
                    }
                    if let Some(s) = secret {
                        tunnel.secret = s.clone();
                    }
                    if let Some(d) = dscp {
                        tunnel.dscp = *d;
                    }
                    if let Some(a) = args {
                        tunnel.args = a.clone();
                    }
                }
            }
            Event::TunnelStatusChanged { id, status } => {
                if let Some(tunnel) = self.tunnels.get_mut(id) {
                    tunnel.status = *status;
                }
            }
            Event::TunnelDeleted { id } => {
                if let Some(tunnel) = self.tunnels.remove(id) {
                    self.name_index.remove(&tunnel.name);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
