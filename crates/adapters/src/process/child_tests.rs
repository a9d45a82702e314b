// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn spawn_true_then_reports_exit_code_zero() {
    let adapter = SpawnedProcessAdapter::new();
    let handle = adapter
        .spawn("probe", "true", &[], &[])
        .await
        .unwrap();

    // Give the short-lived child a moment to exit.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!adapter.is_alive(&handle).await.unwrap());
    assert_eq!(adapter.exit_code(&handle).await.unwrap(), Some(0));
}

#[tokio::test]
async fn spawn_sleep_then_is_alive_until_killed() {
    let adapter = SpawnedProcessAdapter::new();
    let handle = adapter
        .spawn("probe", "sleep", &["5".to_string()], &[])
        .await
        .unwrap();

    assert!(adapter.is_alive(&handle).await.unwrap());

    adapter.kill(&handle).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!adapter.is_alive(&handle).await.unwrap());
}

#[tokio::test]
async fn operations_on_unknown_handle_are_not_found() {
    let adapter = SpawnedProcessAdapter::new();
    let handle = ProcessHandle("does-not-exist".into());
    assert!(matches!(
        adapter.is_alive(&handle).await,
        Err(ProcessError::NotFound(_))
    ));
}

#[tokio::test]
async fn spawn_of_nonexistent_binary_fails() {
    let adapter = SpawnedProcessAdapter::new();
    let result = adapter
        .spawn("probe", "/no/such/binary-xyz", &[], &[])
        .await;
    assert!(matches!(result, Err(ProcessError::SpawnFailed(_))));
}
