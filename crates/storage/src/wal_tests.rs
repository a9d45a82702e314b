// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use tunnel_core::test_support::NewTunnelConfigBuilder;
use tunnel_core::TunnelId;

fn created_event(id: u64) -> Event {
    let new = NewTunnelConfigBuilder::new()
        .name(format!("edge-{id}"))
        .build();
    Event::created(TunnelId(id), &new)
}

#[test]
fn append_and_flush_then_replay_from_scratch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&created_event(1)).unwrap();
        wal.append(&created_event(2)).unwrap();
        wal.flush().unwrap();
    }

    let wal = Wal::open(&path, 0).unwrap();
    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[1].seq, 2);
}

#[test]
fn reopen_resumes_write_seq_past_existing_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&created_event(1)).unwrap();
        wal.flush().unwrap();
    }

    let mut wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 1);
    let seq = wal.append(&created_event(2)).unwrap();
    assert_eq!(seq, 2);
}

#[test]
fn next_unprocessed_advances_and_exhausts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&created_event(1)).unwrap();
    wal.append(&created_event(2)).unwrap();

    let first = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(first.seq, 1);
    wal.mark_processed(first.seq);

    let second = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(second.seq, 2);
    wal.mark_processed(second.seq);

    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn truncate_before_drops_older_entries_but_keeps_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    let mut wal = Wal::open(&path, 0).unwrap();
    wal.append(&created_event(1)).unwrap();
    wal.append(&created_event(2)).unwrap();
    wal.append(&created_event(3)).unwrap();
    wal.flush().unwrap();
    wal.mark_processed(2);

    wal.truncate_before(3).unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 3);
}

#[test]
fn corrupt_tail_is_rotated_to_bak_and_valid_prefix_kept() {
    use std::io::Write as _;

    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&created_event(1)).unwrap();
        wal.flush().unwrap();
    }

    // Append a garbage trailing line simulating a crash mid-write.
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        file.write_all(b"{not valid json\n").unwrap();
    }

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.entries_after(0).unwrap().len(), 1);
    assert!(path.with_extension("bak").exists());
}
