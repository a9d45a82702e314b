// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn base(kind: TunnelKind) -> NewTunnelConfig {
    NewTunnelConfig {
        name: "edge-1".into(),
        kind,
        listen_endpoint: Endpoint::loopback(8080),
        remote_endpoint: None,
        mode: None,
        role: None,
        secret: None,
        dscp: 0,
        args: TunnelArgs::new(),
    }
}

#[test]
fn rejects_empty_name() {
    let mut cfg = base(TunnelKind::ReverseTcp);
    cfg.name = "  ".into();
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "name"
    ));
}

#[parameterized(
    zero = { 0 },
    max = { 63 },
)]
fn accepts_dscp_in_range(dscp: u8) {
    let mut cfg = base(TunnelKind::ReverseTcp);
    cfg.dscp = dscp;
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_dscp_above_six_bits() {
    let mut cfg = base(TunnelKind::ReverseTcp);
    cfg.dscp = 64;
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "dscp"
    ));
}

#[test]
fn udp_raw_requires_mode_and_role() {
    let cfg = base(TunnelKind::UdpRaw);
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "mode"
    ));
}

#[test]
fn udp_raw_client_requires_remote_endpoint() {
    let mut cfg = base(TunnelKind::UdpRaw);
    cfg.mode = Some(Mode::FakeTcp);
    cfg.role = Some(Role::Client);
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "remote_endpoint"
    ));
}

#[test]
fn udp_raw_server_does_not_require_remote_endpoint() {
    let mut cfg = base(TunnelKind::UdpRaw);
    cfg.mode = Some(Mode::Icmp);
    cfg.role = Some(Role::Server);
    assert!(cfg.validate().is_ok());
}

#[test]
fn mtproto_requires_secret() {
    let cfg = base(TunnelKind::Mtproto);
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "secret"
    ));
}

#[test]
fn mtproto_rejects_wrong_length_secret() {
    let mut cfg = base(TunnelKind::Mtproto);
    cfg.secret = Some(Secret::from_bytes(vec![0u8; 8]));
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "secret"
    ));
}

#[test]
fn mtproto_accepts_32_byte_secret() {
    let mut cfg = base(TunnelKind::Mtproto);
    cfg.secret = Some(Secret::from_bytes(vec![0u8; 32]));
    assert!(cfg.validate().is_ok());
}

#[test]
fn chisel_requires_client_or_server_mode() {
    let cfg = base(TunnelKind::ChiselClient);
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "mode"
    ));

    let mut cfg = base(TunnelKind::ChiselServer);
    cfg.mode = Some(Mode::Server);
    assert!(cfg.validate().is_ok());
}

#[test]
fn gre_and_tap_require_iface_name() {
    let cfg = base(TunnelKind::Gre);
    assert!(matches!(
        cfg.validate(),
        Err(SupervisorError::Validation { field, .. }) if field == "args.iface_name"
    ));

    let mut cfg = base(TunnelKind::Tap);
    cfg.args = TunnelArgs::new().with("iface_name", "tap0");
    assert!(cfg.validate().is_ok());
}

#[test]
fn reverse_tcp_has_no_extra_requirements() {
    assert!(base(TunnelKind::ReverseTcp).validate().is_ok());
}
