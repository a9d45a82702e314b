// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The Config Store (spec.md §4.3): a JSONL write-ahead log of `Event`s, a
//! materialized `ConfigState` derived by replaying them, and a background
//! checkpointer that periodically snapshots the state so replay on boot
//! only has to cover the WAL tail.

mod checkpoint;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{CheckpointError, CheckpointResult, Checkpointer};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::ConfigState;
pub use store::{ConfigStore, StoreError};
pub use wal::{Wal, WalEntry, WalError};
