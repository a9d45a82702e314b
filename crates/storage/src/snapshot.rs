// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete `ConfigState` at a point in time,
//! identified by the WAL sequence number it reflects. Recovery loads the
//! snapshot and replays WAL entries after that sequence (spec.md §4.3).

use crate::ConfigState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Bumped whenever `ConfigState`'s on-disk shape changes incompatibly.
/// There has been exactly one shape so far.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A snapshot of `ConfigState` at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub seq: u64,
    pub state: ConfigState,
    pub created_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    CURRENT_SNAPSHOT_VERSION
}

impl Snapshot {
    pub fn new(seq: u64, state: ConfigState) -> Self {
        Self {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state,
            created_at: Utc::now(),
        }
    }

    /// Saves atomically: write to `.tmp`, fsync, then rename, so a crash
    /// mid-write never corrupts the previous snapshot.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Loads a snapshot, returning `Ok(None)` if absent or corrupt. A
    /// corrupt snapshot is moved aside to `.bak` so the daemon falls back to
    /// a full WAL replay instead of refusing to start.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "corrupt snapshot, moving to .bak and starting fresh",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Picks the next `.bak`/`.bak.N` path, rotating older backups out. Keeps
/// up to [`MAX_BAK_FILES`].
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
