// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tunnel_adapters::FakeLinkAdapter;
use tunnel_core::test_support::fixture_tunnel;
use tunnel_core::TunnelKind;

fn base_cfg() -> TunnelConfig {
    let mut cfg = fixture_tunnel(1, TunnelKind::Tap);
    cfg.args = cfg.args.with("iface_name", "tap-test0").with("cidr", "10.20.0.1/24").with("mtu", "1400");
    cfg
}

#[tokio::test]
async fn start_creates_tap_interface() {
    let link = FakeLinkAdapter::new();
    let cfg = base_cfg();
    let handle = start(&cfg, &link).await.unwrap();
    assert!(matches!(handle, StartedHandle::Synchronous));
    assert!(link.exists("tap-test0").await.unwrap());
}

#[tokio::test]
async fn stop_is_idempotent_on_absent_interface() {
    let link = FakeLinkAdapter::new();
    let cfg = base_cfg();
    stop(&cfg, &link).await.unwrap();
}
