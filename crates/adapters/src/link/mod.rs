// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kernel GRE/TAP interface management (C7, spec.md §4.7).

mod noop;
mod os;

pub use noop::NoOpLinkAdapter;
pub use os::OsLinkAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLinkAdapter, LinkCall};

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("interface not found: {0}")]
    NotFound(String),
    #[error("interface already exists: {0}")]
    AlreadyExists(String),
    #[error("link command failed: {0}")]
    CommandFailed(String),
    #[error("insufficient privilege to manage kernel interfaces")]
    Privilege,
}

/// Adapter for creating and destroying kernel GRE/TAP interfaces. Each
/// create is all-or-nothing: on partial failure the adapter rolls back any
/// side effect it already applied before surfacing the error.
#[async_trait]
pub trait LinkAdapter: Clone + Send + Sync + 'static {
    /// Creates a GRE tunnel interface between `local` and `remote`, assigning
    /// `tunnel_cidr` to it.
    async fn create_gre(
        &self,
        iface_name: &str,
        local: IpAddr,
        remote: IpAddr,
        tunnel_cidr: &str,
    ) -> Result<(), LinkError>;

    /// Creates a TAP interface with the given `cidr` and `mtu`.
    async fn create_tap(&self, iface_name: &str, cidr: &str, mtu: u32) -> Result<(), LinkError>;

    /// Destroys the named interface. Idempotent: destroying an interface
    /// that is already absent is not an error.
    async fn destroy(&self, iface_name: &str) -> Result<(), LinkError>;

    /// Reports whether the named interface currently exists on the host.
    async fn exists(&self, iface_name: &str) -> Result<bool, LinkError>;
}
