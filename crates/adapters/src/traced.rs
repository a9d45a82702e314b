// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability.

use crate::link::{LinkAdapter, LinkError};
use crate::process::{ProcessAdapter, ProcessError, ProcessHandle};
use async_trait::async_trait;
use std::net::IpAddr;
use tracing::Instrument;

/// Wrapper that adds tracing spans/logs to any `ProcessAdapter`.
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(
        &self,
        name: &str,
        cmd: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<ProcessHandle, ProcessError> {
        async {
            tracing::info!(cmd, arg_count = args.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(name, cmd, args, env).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(handle) => tracing::info!(%handle, elapsed_ms, "process spawned"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("process.spawn", name))
        .await
    }

    async fn kill(&self, handle: &ProcessHandle) -> Result<(), ProcessError> {
        let result = self.inner.kill(handle).await;
        tracing::info_span!("process.kill", %handle).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }

    async fn is_alive(&self, handle: &ProcessHandle) -> Result<bool, ProcessError> {
        let result = self.inner.is_alive(handle).await;
        tracing::trace!(%handle, alive = ?result.as_ref().ok(), "checked");
        result
    }

    async fn exit_code(&self, handle: &ProcessHandle) -> Result<Option<i32>, ProcessError> {
        self.inner.exit_code(handle).await
    }
}

/// Wrapper that adds tracing spans/logs to any `LinkAdapter`.
#[derive(Clone)]
pub struct TracedLink<L> {
    inner: L,
}

impl<L> TracedLink<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<L: LinkAdapter> LinkAdapter for TracedLink<L> {
    async fn create_gre(
        &self,
        iface_name: &str,
        local: IpAddr,
        remote: IpAddr,
        tunnel_cidr: &str,
    ) -> Result<(), LinkError> {
        let span = tracing::info_span!("link.create_gre", iface_name, %local, %remote);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create_gre(iface_name, local, remote, tunnel_cidr).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "GRE interface created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create_gre failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create_tap(&self, iface_name: &str, cidr: &str, mtu: u32) -> Result<(), LinkError> {
        let span = tracing::info_span!("link.create_tap", iface_name, cidr, mtu);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create_tap(iface_name, cidr, mtu).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "TAP interface created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create_tap failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn destroy(&self, iface_name: &str) -> Result<(), LinkError> {
        let result = self.inner.destroy(iface_name).await;
        tracing::info_span!("link.destroy", iface_name).in_scope(|| match &result {
            Ok(()) => tracing::info!("destroyed"),
            Err(e) => tracing::warn!(error = %e, "destroy failed (may be expected)"),
        });
        result
    }

    async fn exists(&self, iface_name: &str) -> Result<bool, LinkError> {
        self.inner.exists(iface_name).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
