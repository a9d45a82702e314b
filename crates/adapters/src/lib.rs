// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the external I/O the engine drives: spawning and supervising
//! child processes (C6: chisel client/server) and managing kernel network
//! links (C7: gre/tap via `ip`). Each has a real/no-op/fake trio so engine
//! logic can be tested without touching the OS.

pub mod link;
pub mod process;
pub mod traced;

pub use link::{LinkAdapter, LinkError, NoOpLinkAdapter, OsLinkAdapter};
pub use process::{NoOpProcessAdapter, ProcessAdapter, ProcessError, ProcessHandle, SpawnedProcessAdapter};
pub use traced::{TracedLink, TracedProcess};

#[cfg(any(test, feature = "test-support"))]
pub use link::{FakeLinkAdapter, LinkCall};
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessAdapter, ProcessCall};
