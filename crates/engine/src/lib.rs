// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tunnel-engine: the Tunnel Engine's Supervisor Registry (C2), Lifecycle
//! Driver (C3), boot-time reconciliation (C2), and the four data-plane
//! components (C4 TCP Forwarder, C5 Raw-Socket Engine, C6 child-process
//! supervision, C7 Link Manager wiring) that `kinds` dispatches to.

pub mod dataplane;
pub mod driver;
pub mod error;
pub mod kinds;
pub mod reconcile;
pub mod registry;

pub use driver::Driver;
pub use error::EngineError;
pub use registry::{Registry, RunningHandle, STOP_GRACE};
