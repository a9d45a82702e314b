// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_key_value_splits_on_first_equals() {
    let (k, v) = parse_key_value("target=10.0.0.1:8080").unwrap();
    assert_eq!(k, "target");
    assert_eq!(v, "10.0.0.1:8080");
}

#[test]
fn parse_key_value_rejects_missing_equals() {
    assert!(parse_key_value("no-equals-here").is_err());
}

#[test]
fn build_args_collects_all_pairs() {
    let args = build_args(vec![("iface_name".into(), "tun7".into()), ("mtu".into(), "9000".into())]);
    assert_eq!(args.iface_name(), Some("tun7"));
    assert_eq!(args.mtu(), 9000);
}

#[test]
fn kind_arg_round_trips_through_tunnel_kind() {
    let kind: tunnel_core::TunnelKind = KindArg::Mtproto.into();
    assert_eq!(kind, tunnel_core::TunnelKind::Mtproto);
    let back: KindArg = kind.into();
    assert!(matches!(back, KindArg::Mtproto));
}

#[test]
fn parse_secret_rejects_non_hex() {
    assert!(parse_secret("not-hex").is_err());
}

#[test]
fn parse_secret_accepts_64_hex_chars() {
    let hex = "ab".repeat(32);
    assert!(parse_secret(&hex).is_ok());
}
