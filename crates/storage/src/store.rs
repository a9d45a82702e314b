// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ConfigStore`: the Config Store component from spec.md §4.3, gluing the
//! WAL, materialized `ConfigState`, and background `Checkpointer` behind one
//! lock so every mutation is WAL-then-apply in a single critical section.

use crate::{checkpoint::CheckpointError, wal::WalError, ConfigState, Snapshot, SnapshotError};
use crate::{Checkpointer, Wal};
use parking_lot::Mutex;
use std::path::Path;
use thiserror::Error;
use tunnel_core::config::NewTunnelConfig;
use tunnel_core::{Event, IdGen, SequentialIdGen, SupervisorError, TunnelConfig, TunnelId, TunnelPatch, TunnelStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl From<StoreError> for SupervisorError {
    fn from(e: StoreError) -> Self {
        SupervisorError::backend(e.to_string())
    }
}

const CHECKPOINT_INTERVAL_EVENTS: u64 = 500;

struct Inner {
    state: ConfigState,
    wal: Wal,
}

/// The Config Store: a single user-level daemon's authoritative registry of
/// `TunnelConfig`s, durable across restarts (spec.md §4.1, §4.3).
pub struct ConfigStore {
    inner: Mutex<Inner>,
    id_gen: SequentialIdGen,
    checkpointer: Checkpointer,
    events_since_checkpoint: Mutex<u64>,
}

impl ConfigStore {
    /// Opens (or creates) the store under `state_dir`, loading the most
    /// recent snapshot and replaying any WAL entries after it.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(state_dir)?;
        let snapshot_path = state_dir.join("snapshot.bin");
        let wal_path = state_dir.join("wal.jsonl");

        let snapshot = crate::checkpoint::load_snapshot(&snapshot_path)?;
        let (mut state, processed_seq, mut highest_id) = match snapshot {
            Some(Snapshot { state, seq, .. }) => {
                let highest = state.tunnels.keys().map(|id| id.get()).max().unwrap_or(0);
                (state, seq, highest)
            }
            None => (ConfigState::default(), 0, 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        let tail = wal.entries_after(processed_seq)?;
        let mut last_seq = processed_seq;
        for entry in &tail {
            state.apply_event(&entry.event);
            highest_id = highest_id.max(entry.event.tunnel_id().get());
            last_seq = last_seq.max(entry.seq);
        }
        wal.mark_processed(last_seq);

        Ok(Self {
            inner: Mutex::new(Inner { state, wal }),
            id_gen: SequentialIdGen::starting_after(highest_id),
            checkpointer: Checkpointer::new(snapshot_path),
            events_since_checkpoint: Mutex::new(0),
        })
    }

    pub fn list(&self) -> Vec<TunnelConfig> {
        self.lock_state(|state| state.iter().cloned().collect())
    }

    pub fn get(&self, id: TunnelId) -> Option<TunnelConfig> {
        self.lock_state(|state| state.get(id).cloned())
    }

    pub fn get_by_name(&self, name: &str) -> Option<TunnelConfig> {
        self.lock_state(|state| state.get_by_name(name).cloned())
    }

    /// `tunnel.create` (spec.md §4.1). Validates, checks name uniqueness
    /// under the same lock as the WAL append, then applies.
    pub fn create(&self, new: NewTunnelConfig) -> Result<TunnelConfig, SupervisorError> {
        new.validate()?;

        let mut inner = self.inner.lock();
        if inner.state.name_taken(&new.name) {
            return Err(SupervisorError::DuplicateName { name: new.name });
        }

        let id = TunnelId(self.id_gen.next());
        let event = Event::created(id, &new);
        inner.wal.append(&event).map_err(StoreError::from)?;
        inner.wal.flush().map_err(StoreError::from)?;
        inner.state.apply_event(&event);
        drop(inner);

        self.note_event_appended();
        // the event was just applied to state under the lock held above
        #[allow(clippy::expect_used)]
        Ok(self.get(id).expect("just-created tunnel is present"))
    }

    /// `tunnel.delete`. Errors with [`SupervisorError::AlreadyRunning`] if
    /// the caller should stop it first (spec.md §4.1 edge case).
    pub fn delete(&self, id: TunnelId) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock();
        let tunnel = inner
            .state
            .get(id)
            .cloned()
            .ok_or(SupervisorError::NotFound(id))?;
        if tunnel.status == TunnelStatus::Running {
            return Err(SupervisorError::AlreadyRunning(id));
        }

        let event = Event::TunnelDeleted { id };
        inner.wal.append(&event).map_err(StoreError::from)?;
        inner.wal.flush().map_err(StoreError::from)?;
        inner.state.apply_event(&event);
        drop(inner);

        self.note_event_appended();
        Ok(())
    }

    /// `tunnel.update` (spec.md §4.3). Refuses a running tunnel: fields
    /// only take effect on the next Start.
    pub fn update(&self, id: TunnelId, patch: TunnelPatch) -> Result<TunnelConfig, SupervisorError> {
        patch.validate()?;

        let mut inner = self.inner.lock();
        let tunnel = inner.state.get(id).ok_or(SupervisorError::NotFound(id))?;
        if tunnel.status == TunnelStatus::Running {
            return Err(SupervisorError::AlreadyRunning(id));
        }

        let event = Event::TunnelUpdated {
            id,
            listen_endpoint: patch.listen_endpoint,
            remote_endpoint: patch.remote_endpoint,
            mode: patch.mode,
            role: patch.role,
            secret: patch.secret,
            dscp: patch.dscp,
            args: patch.args,
        };
        inner.wal.append(&event).map_err(StoreError::from)?;
        inner.wal.flush().map_err(StoreError::from)?;
        inner.state.apply_event(&event);
        drop(inner);

        self.note_event_appended();
        // the event was just applied to state under the lock held above
        #[allow(clippy::expect_used)]
        Ok(self.get(id).expect("just-updated tunnel is present"))
    }

    /// Records a status transition driven by the reconciler (spec.md §4.2).
    pub fn set_status(&self, id: TunnelId, status: TunnelStatus) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock();
        if inner.state.get(id).is_none() {
            return Err(SupervisorError::NotFound(id));
        }

        let event = Event::TunnelStatusChanged { id, status };
        inner.wal.append(&event).map_err(StoreError::from)?;
        inner.wal.flush().map_err(StoreError::from)?;
        inner.state.apply_event(&event);
        drop(inner);

        self.note_event_appended();
        Ok(())
    }

    fn lock_state<T>(&self, f: impl FnOnce(&ConfigState) -> T) -> T {
        let inner = self.inner.lock();
        f(&inner.state)
    }

    fn note_event_appended(&self) {
        let mut count = self.events_since_checkpoint.lock();
        *count += 1;
        if *count >= CHECKPOINT_INTERVAL_EVENTS {
            *count = 0;
            drop(count);
            let _ = self.checkpoint();
        }
    }

    /// Forces a background checkpoint and, once durable, truncates the WAL
    /// up to the checkpointed sequence (spec.md §4.3's ordering invariant:
    /// snapshot must be durable before truncation).
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        let (seq, state_clone) = {
            let inner = self.inner.lock();
            (inner.wal.processed_seq(), inner.state.clone())
        };
        let result = self.checkpointer.start(seq, &state_clone).wait()?;

        let mut inner = self.inner.lock();
        inner.wal.truncate_before(result.seq)?;
        Ok(())
    }

    /// Synchronous checkpoint for graceful shutdown (spec.md §5 C1).
    pub fn checkpoint_sync(&self) -> Result<(), StoreError> {
        let (seq, state_clone) = {
            let inner = self.inner.lock();
            (inner.wal.processed_seq(), inner.state.clone())
        };
        let result = self.checkpointer.checkpoint_sync(seq, &state_clone)?;
        let mut inner = self.inner.lock();
        inner.wal.truncate_before(result.seq)?;
        Ok(())
    }

}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
