// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake link adapter for deterministic engine tests.

use super::{LinkAdapter, LinkError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum LinkCall {
    CreateGre {
        iface_name: String,
        local: IpAddr,
        remote: IpAddr,
        tunnel_cidr: String,
    },
    CreateTap {
        iface_name: String,
        cidr: String,
        mtu: u32,
    },
    Destroy { iface_name: String },
}

struct State {
    ifaces: HashSet<String>,
    calls: Vec<LinkCall>,
    fail_next: Option<LinkError>,
}

/// Fake link adapter: tracks interface names in memory, no kernel calls.
#[derive(Clone)]
pub struct FakeLinkAdapter {
    inner: Arc<Mutex<State>>,
}

impl Default for FakeLinkAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                ifaces: HashSet::new(),
                calls: Vec::new(),
                fail_next: None,
            })),
        }
    }
}

impl FakeLinkAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LinkCall> {
        self.inner.lock().calls.clone()
    }

    /// Makes the next create/destroy call return `error` instead of succeeding.
    pub fn fail_next(&self, error: LinkError) {
        self.inner.lock().fail_next = Some(error);
    }

    fn take_failure(inner: &mut State) -> Option<LinkError> {
        inner.fail_next.take()
    }
}

#[async_trait]
impl LinkAdapter for FakeLinkAdapter {
    async fn create_gre(
        &self,
        iface_name: &str,
        local: IpAddr,
        remote: IpAddr,
        tunnel_cidr: &str,
    ) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LinkCall::CreateGre {
            iface_name: iface_name.to_string(),
            local,
            remote,
            tunnel_cidr: tunnel_cidr.to_string(),
        });
        if let Some(e) = Self::take_failure(&mut inner) {
            return Err(e);
        }
        if !inner.ifaces.insert(iface_name.to_string()) {
            return Err(LinkError::AlreadyExists(iface_name.to_string()));
        }
        Ok(())
    }

    async fn create_tap(&self, iface_name: &str, cidr: &str, mtu: u32) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LinkCall::CreateTap {
            iface_name: iface_name.to_string(),
            cidr: cidr.to_string(),
            mtu,
        });
        if let Some(e) = Self::take_failure(&mut inner) {
            return Err(e);
        }
        if !inner.ifaces.insert(iface_name.to_string()) {
            return Err(LinkError::AlreadyExists(iface_name.to_string()));
        }
        Ok(())
    }

    async fn destroy(&self, iface_name: &str) -> Result<(), LinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(LinkCall::Destroy {
            iface_name: iface_name.to_string(),
        });
        if let Some(e) = Self::take_failure(&mut inner) {
            return Err(e);
        }
        inner.ifaces.remove(iface_name);
        Ok(())
    }

    async fn exists(&self, iface_name: &str) -> Result<bool, LinkError> {
        Ok(self.inner.lock().ifaces.contains(iface_name))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
