// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for tunnels and their live runtime handles.
//!
//! Unlike the teacher's string/UUID ids, `TunnelId` is the opaque
//! monotonically assigned integer spec.md §3 calls for (I1: unique,
//! immutable once assigned).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a registered tunnel. Assigned by the Config Store
/// on Create; never reused or mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TunnelId(pub u64);

impl TunnelId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TunnelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-zero while the Registry holds a live handle for a tunnel; reset to
/// zero on exit (spec.md §3 I4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeToken(pub u64);

impl RuntimeToken {
    pub const NONE: RuntimeToken = RuntimeToken(0);

    pub fn is_live(self) -> bool {
        self.0 != 0
    }
}

/// Generates identifiers. Mirrors `oj_core::id::IdGen`, narrowed to the
/// integer ids this spec uses.
pub trait IdGen: Send + Sync {
    fn next(&self) -> u64;
}

/// Monotonic in-process id generator backing the Config Store's `TunnelId`
/// and `RuntimeToken` assignment.
#[derive(Default)]
pub struct SequentialIdGen {
    counter: AtomicU64,
}

impl SequentialIdGen {
    /// Resume counting after the given high-water mark (used when replaying
    /// the WAL so ids never collide with previously persisted ones).
    pub fn starting_after(last: u64) -> Self {
        Self {
            counter: AtomicU64::new(last),
        }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
