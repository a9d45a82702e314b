// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op link adapter, used when a deployment disables GRE/TAP kinds.

use super::{LinkAdapter, LinkError};
use async_trait::async_trait;
use std::net::IpAddr;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLinkAdapter;

impl NoOpLinkAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkAdapter for NoOpLinkAdapter {
    async fn create_gre(
        &self,
        _iface_name: &str,
        _local: IpAddr,
        _remote: IpAddr,
        _tunnel_cidr: &str,
    ) -> Result<(), LinkError> {
        Ok(())
    }

    async fn create_tap(&self, _iface_name: &str, _cidr: &str, _mtu: u32) -> Result<(), LinkError> {
        Ok(())
    }

    async fn destroy(&self, _iface_name: &str) -> Result<(), LinkError> {
        Ok(())
    }

    async fn exists(&self, _iface_name: &str) -> Result<bool, LinkError> {
        Ok(false)
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
