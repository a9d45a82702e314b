// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn sequential_ids_are_unique_and_increasing() {
    let gen = SequentialIdGen::default();
    let a = gen.next();
    let b = gen.next();
    let c = gen.next();
    assert_eq!((a, b, c), (1, 2, 3));
}

#[test]
fn starting_after_resumes_past_high_water_mark() {
    let gen = SequentialIdGen::starting_after(41);
    assert_eq!(gen.next(), 42);
}

#[test]
fn runtime_token_none_is_not_live() {
    assert!(!RuntimeToken::NONE.is_live());
    assert!(RuntimeToken(7).is_live());
}

#[test]
fn tunnel_id_displays_as_integer() {
    assert_eq!(TunnelId(5).to_string(), "5");
}
