// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn spawn_returns_a_handle_and_reports_dead() {
    let adapter = NoOpProcessAdapter::new();
    let handle = adapter.spawn("x", "chisel", &[], &[]).await.unwrap();
    assert!(!adapter.is_alive(&handle).await.unwrap());
    assert_eq!(adapter.exit_code(&handle).await.unwrap(), None);
    adapter.kill(&handle).await.unwrap();
}
