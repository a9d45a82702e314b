// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

/// Creating kernel interfaces requires `NET_ADMIN`; these are exercised only
/// in CI jobs that run privileged, never in ordinary `cargo test` runs.
#[tokio::test]
#[ignore = "requires NET_ADMIN and a real network namespace"]
async fn create_and_destroy_tap_round_trips() {
    let adapter = OsLinkAdapter::new();
    let iface = "tn-test-tap0";

    assert!(!adapter.exists(iface).await.unwrap());
    adapter
        .create_tap(iface, "10.250.0.1/24", 1400)
        .await
        .unwrap();
    assert!(adapter.exists(iface).await.unwrap());

    adapter.destroy(iface).await.unwrap();
    assert!(!adapter.exists(iface).await.unwrap());
}

#[tokio::test]
async fn exists_reports_false_for_unknown_interface() {
    let adapter = OsLinkAdapter::new();
    assert!(!adapter.exists("tn-definitely-absent-9999").await.unwrap());
}

#[tokio::test]
async fn destroy_of_absent_interface_is_not_an_error() {
    let adapter = OsLinkAdapter::new();
    adapter.destroy("tn-definitely-absent-9999").await.unwrap();
}
