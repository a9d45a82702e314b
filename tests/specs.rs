//! Behavioral specifications for the tunnel supervisor.
//!
//! These tests are black-box: they invoke the `tunnel` CLI binary (which
//! auto-spawns `tunneld`) and verify stdout/stderr/exit codes and the
//! resulting tunnel state. See spec.md §8 for the scenarios these implement.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/lifecycle.rs"]
mod lifecycle;
#[path = "specs/reconciliation.rs"]
mod reconciliation;
#[path = "specs/raw_socket.rs"]
mod raw_socket;
