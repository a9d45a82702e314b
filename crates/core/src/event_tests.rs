// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::config::{TunnelArgs, TunnelKind};

#[test]
fn created_copies_new_tunnel_config_fields() {
    let new = NewTunnelConfig {
        name: "edge-1".into(),
        kind: TunnelKind::ReverseTcp,
        listen_endpoint: Endpoint::loopback(8080),
        remote_endpoint: None,
        mode: None,
        role: None,
        secret: None,
        dscp: 10,
        args: TunnelArgs::new().with("target", "example.com:443"),
    };
    let event = Event::created(TunnelId(1), &new);
    match &event {
        Event::TunnelCreated { id, name, dscp, .. } => {
            assert_eq!(*id, TunnelId(1));
            assert_eq!(name, "edge-1");
            assert_eq!(*dscp, 10);
        }
        _ => panic!("expected TunnelCreated"),
    }
    assert_eq!(event.tunnel_id(), TunnelId(1));
}

#[test]
fn round_trips_through_json() {
    let event = Event::TunnelStatusChanged {
        id: TunnelId(3),
        status: TunnelStatus::Running,
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back.tunnel_id(), TunnelId(3));
}

#[test]
fn deleted_carries_only_id() {
    let event = Event::TunnelDeleted { id: TunnelId(9) };
    assert_eq!(event.tunnel_id(), TunnelId(9));
}
