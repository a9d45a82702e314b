// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use tunnel_core::test_support::NewTunnelConfigBuilder;
use tunnel_core::{Event, TunnelId};

fn state_with_one_tunnel() -> ConfigState {
    let mut state = ConfigState::default();
    let new = NewTunnelConfigBuilder::new().name("edge-1").build();
    state.apply_event(&Event::created(TunnelId(1), &new));
    state
}

#[test]
fn save_and_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let snapshot = Snapshot::new(42, state_with_one_tunnel());
    snapshot.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 42);
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state.tunnels.len(), 1);
}

#[test]
fn load_nonexistent_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.json");
    assert!(Snapshot::load(&path).unwrap().is_none());
}

#[test]
fn load_corrupt_file_rotates_to_bak_and_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(&path, b"not json").unwrap();

    let result = Snapshot::load(&path).unwrap();
    assert!(result.is_none());
    assert!(path.with_extension("bak").exists());
}
