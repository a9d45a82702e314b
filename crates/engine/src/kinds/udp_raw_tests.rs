// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tunnel_core::test_support::fixture_tunnel;
use tunnel_core::TunnelKind;

fn base_cfg() -> TunnelConfig {
    fixture_tunnel(1, TunnelKind::UdpRaw)
}

#[tokio::test]
async fn start_requires_mode() {
    let cfg = base_cfg();
    assert!(cfg.mode.is_none());
    assert!(start(&cfg).await.is_err());
}

#[tokio::test]
async fn start_requires_role() {
    let mut cfg = base_cfg();
    cfg.mode = Some(Mode::FakeTcp);
    assert!(cfg.role.is_none());
    assert!(start(&cfg).await.is_err());
}

#[tokio::test]
async fn start_rejects_client_server_mode() {
    let mut cfg = base_cfg();
    cfg.mode = Some(Mode::Client);
    cfg.role = Some(Role::Client);
    cfg.remote_endpoint = Some(tunnel_core::Endpoint::new("198.51.100.7".parse().unwrap(), 443));
    assert!(start(&cfg).await.is_err());
}

#[tokio::test]
async fn start_client_requires_remote_endpoint() {
    let mut cfg = base_cfg();
    cfg.mode = Some(Mode::FakeTcp);
    cfg.role = Some(Role::Client);
    cfg.remote_endpoint = None;
    assert!(start(&cfg).await.is_err());
}

#[tokio::test]
async fn start_rejects_ipv6_remote_endpoint() {
    let mut cfg = base_cfg();
    cfg.mode = Some(Mode::Icmp);
    cfg.role = Some(Role::Client);
    cfg.remote_endpoint = Some(tunnel_core::Endpoint::new("::1".parse().unwrap(), 443));
    assert!(start(&cfg).await.is_err());
}

/// Actually opening a raw socket needs `NET_RAW`; exercised only by the
/// privileged `client_tests.rs`/`server_tests.rs` suites.
#[tokio::test]
async fn start_server_requires_remote_endpoint() {
    let mut cfg = base_cfg();
    cfg.mode = Some(Mode::RawUdp);
    cfg.role = Some(Role::Server);
    cfg.remote_endpoint = None;
    assert!(start(&cfg).await.is_err());
}
