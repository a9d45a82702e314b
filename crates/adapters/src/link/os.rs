// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `LinkAdapter`, driving the host's `ip` CLI.

use super::{LinkAdapter, LinkError};
use async_trait::async_trait;
use std::net::IpAddr;
use tokio::process::Command;

/// Shells out to `ip link`/`ip addr`/`ip tuntap` to manage GRE and TAP
/// interfaces. Every create rolls back its own partial work on failure so
/// callers never observe a half-configured interface.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsLinkAdapter;

impl OsLinkAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn run(args: &[&str]) -> Result<(), LinkError> {
        let output = Command::new("ip")
            .args(args)
            .output()
            .await
            .map_err(|e| LinkError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Operation not permitted") {
                return Err(LinkError::Privilege);
            }
            return Err(LinkError::CommandFailed(stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn link_exists(iface_name: &str) -> Result<bool, LinkError> {
        let output = Command::new("ip")
            .args(["link", "show", iface_name])
            .output()
            .await
            .map_err(|e| LinkError::CommandFailed(e.to_string()))?;
        Ok(output.status.success())
    }
}

#[async_trait]
impl LinkAdapter for OsLinkAdapter {
    async fn create_gre(
        &self,
        iface_name: &str,
        local: IpAddr,
        remote: IpAddr,
        tunnel_cidr: &str,
    ) -> Result<(), LinkError> {
        if Self::link_exists(iface_name).await? {
            return Err(LinkError::AlreadyExists(iface_name.to_string()));
        }

        let local = local.to_string();
        let remote = remote.to_string();
        Self::run(&[
            "tunnel", "add", iface_name, "mode", "gre", "local", &local, "remote", &remote,
            "ttl", "255",
        ])
        .await?;

        if let Err(e) = Self::run(&["link", "set", iface_name, "up"]).await {
            let _ = Self::run(&["tunnel", "del", iface_name]).await;
            return Err(e);
        }

        if let Err(e) = Self::run(&["addr", "add", tunnel_cidr, "dev", iface_name]).await {
            let _ = Self::run(&["tunnel", "del", iface_name]).await;
            return Err(e);
        }

        tracing::info!(iface_name, %local, %remote, tunnel_cidr, "GRE interface created");
        Ok(())
    }

    async fn create_tap(&self, iface_name: &str, cidr: &str, mtu: u32) -> Result<(), LinkError> {
        if Self::link_exists(iface_name).await? {
            return Err(LinkError::AlreadyExists(iface_name.to_string()));
        }

        Self::run(&["tuntap", "add", "dev", iface_name, "mode", "tap"]).await?;

        let mtu_str = mtu.to_string();
        if let Err(e) = Self::run(&["link", "set", iface_name, "mtu", &mtu_str]).await {
            let _ = Self::run(&["link", "del", iface_name]).await;
            return Err(e);
        }

        if let Err(e) = Self::run(&["addr", "add", cidr, "dev", iface_name]).await {
            let _ = Self::run(&["link", "del", iface_name]).await;
            return Err(e);
        }

        if let Err(e) = Self::run(&["link", "set", iface_name, "up"]).await {
            let _ = Self::run(&["link", "del", iface_name]).await;
            return Err(e);
        }

        tracing::info!(iface_name, cidr, mtu, "TAP interface created");
        Ok(())
    }

    async fn destroy(&self, iface_name: &str) -> Result<(), LinkError> {
        if !Self::link_exists(iface_name).await? {
            return Ok(());
        }
        Self::run(&["link", "del", iface_name]).await
    }

    async fn exists(&self, iface_name: &str) -> Result<bool, LinkError> {
        Self::link_exists(iface_name).await
    }
}

#[cfg(test)]
#[path = "os_tests.rs"]
mod tests;
