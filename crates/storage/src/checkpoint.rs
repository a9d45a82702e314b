// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background checkpointing with zstd compression and durable fsync.
//!
//! ```text
//! Main Thread                    Background Thread
//! ───────────────────────────    ─────────────────────────────
//! clone state
//!   │
//!   └─────────────────────────→  serialize + compress
//!                                write to .tmp
//!                                fsync .tmp
//!                                rename → snapshot
//!                                fsync directory
//!                                  │
//!   ←────────────────────────────┘ (completion signal)
//! truncate WAL (safe now)
//! ```
//!
//! `CheckpointWriter` abstracts the filesystem operations so tests can
//! inject a fake and assert on the fsync-before-truncate ordering without
//! touching a real disk.

use crate::{ConfigState, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
    #[error("checkpoint failed: {0}")]
    Failed(String),
}

impl From<SnapshotError> for CheckpointError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Io(e) => CheckpointError::Io(e),
            SnapshotError::Json(e) => CheckpointError::Serialize(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub seq: u64,
    pub size_bytes: u64,
}

/// Abstracts checkpoint I/O so tests can fake it (spec.md's test-tooling
/// expectations, mirrored from the teacher's `CheckpointWriter`).
pub trait CheckpointWriter: Send + Sync + 'static {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), CheckpointError>;
    fn fsync_file(&self, path: &Path) -> Result<(), CheckpointError>;
    fn rename(&self, from: &Path, to: &Path) -> Result<(), CheckpointError>;
    fn fsync_dir(&self, path: &Path) -> Result<(), CheckpointError>;
    fn file_size(&self, path: &Path) -> Result<u64, CheckpointError>;
}

#[derive(Clone)]
pub struct FsCheckpointWriter;

impl CheckpointWriter for FsCheckpointWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), CheckpointError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), CheckpointError> {
        std::fs::rename(from, to)?;
        Ok(())
    }

    fn fsync_dir(&self, path: &Path) -> Result<(), CheckpointError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn file_size(&self, path: &Path) -> Result<u64, CheckpointError> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// A running background checkpoint. Must be [`Self::wait`]ed before the WAL
/// is truncated.
pub struct CheckpointHandle {
    pub seq: u64,
    receiver: mpsc::Receiver<Result<CheckpointResult, CheckpointError>>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl CheckpointHandle {
    pub fn wait(self) -> Result<CheckpointResult, CheckpointError> {
        self.receiver
            .recv()
            .map_err(|_| CheckpointError::Failed("checkpoint thread panicked".into()))?
    }

    pub fn try_wait(&self) -> Option<Result<CheckpointResult, CheckpointError>> {
        self.receiver.try_recv().ok()
    }
}

/// Manages background snapshot operations for one daemon instance.
pub struct Checkpointer<W: CheckpointWriter = FsCheckpointWriter> {
    writer: W,
    snapshot_path: PathBuf,
    compression_level: i32,
}

impl Checkpointer<FsCheckpointWriter> {
    pub fn new(snapshot_path: PathBuf) -> Self {
        Self::with_writer(FsCheckpointWriter, snapshot_path)
    }
}

impl<W: CheckpointWriter + Clone> Checkpointer<W> {
    pub fn with_writer(writer: W, snapshot_path: PathBuf) -> Self {
        Self {
            writer,
            snapshot_path,
            compression_level: 3,
        }
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Starts a background checkpoint; the caller must `wait()` the handle
    /// before truncating the WAL up to `seq`.
    pub fn start(&self, seq: u64, state: &ConfigState) -> CheckpointHandle {
        let state_clone = state.clone();
        let writer = self.writer.clone();
        let snapshot_path = self.snapshot_path.clone();
        let compression_level = self.compression_level;

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let result = checkpoint_blocking(
                &writer,
                seq,
                &state_clone,
                &snapshot_path,
                compression_level,
            );
            let _ = tx.send(result);
        });

        CheckpointHandle {
            seq,
            receiver: rx,
            handle,
        }
    }

    /// Synchronous checkpoint, used on graceful shutdown.
    pub fn checkpoint_sync(
        &self,
        seq: u64,
        state: &ConfigState,
    ) -> Result<CheckpointResult, CheckpointError> {
        checkpoint_blocking(&self.writer, seq, state, &self.snapshot_path, self.compression_level)
    }
}

fn checkpoint_blocking<W: CheckpointWriter>(
    writer: &W,
    seq: u64,
    state: &ConfigState,
    snapshot_path: &Path,
    compression_level: i32,
) -> Result<CheckpointResult, CheckpointError> {
    let tmp_path = snapshot_path.with_extension("tmp");

    let snapshot = Snapshot {
        version: CURRENT_SNAPSHOT_VERSION,
        seq,
        state: state.clone(),
        created_at: Utc::now(),
    };

    let json_bytes = serde_json::to_vec(&snapshot)?;
    let compressed = zstd::encode_all(json_bytes.as_slice(), compression_level)
        .map_err(|e| CheckpointError::Compress(e.to_string()))?;

    writer.write_tmp(&tmp_path, &compressed)?;
    writer.fsync_file(&tmp_path)?;
    writer.rename(&tmp_path, snapshot_path)?;
    if let Some(parent) = snapshot_path.parent() {
        writer.fsync_dir(parent)?;
    }

    let size_bytes = writer
        .file_size(snapshot_path)
        .unwrap_or(compressed.len() as u64);

    Ok(CheckpointResult { seq, size_bytes })
}

/// Loads a zstd-compressed snapshot written by [`Checkpointer`].
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    let decoder = zstd::stream::read::Decoder::new(file)
        .map_err(|e| SnapshotError::Io(std::io::Error::other(e.to_string())))?;
    let snapshot: Snapshot = serde_json::from_reader(decoder)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
