// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The cross-cutting error taxonomy (spec.md §7). Every fallible operation
//! in the supervisor ultimately reports one of these variants; crate-local
//! error enums elsewhere in the workspace carry `#[from]`/`From` conversions
//! into this one at their crate boundary.

use crate::id::TunnelId;

/// Stable error taxonomy returned to CLI/IPC callers (spec.md §7).
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// A field failed structural validation (bad dscp, missing mode, ...).
    #[error("validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// `tunnel.create` with a `name` already held by another tunnel.
    #[error("a tunnel named {name:?} already exists")]
    DuplicateName { name: String },

    /// Lookup by id found nothing.
    #[error("no such tunnel: {0}")]
    NotFound(TunnelId),

    /// `tunnel.start` on a tunnel whose status is already `running`.
    #[error("tunnel {0} is already running")]
    AlreadyRunning(TunnelId),

    /// An operation needs `CAP_NET_RAW`/`CAP_NET_ADMIN` (or root) and the
    /// daemon does not have it.
    #[error("operation requires elevated privilege: {0}")]
    Privilege(String),

    /// The requested listen address/port (or, for gre/tap, interface name)
    /// is already in use by something other than this tunnel.
    #[error("resource busy: {0}")]
    ResourceBusy(String),

    /// A backend primitive failed in a way that is not expected to succeed
    /// on retry without operator intervention (socket setup, exec failure).
    #[error("backend error: {0}")]
    Backend(String),

    /// A transient data-plane failure (a single dropped packet, a timed-out
    /// read). Never escapes a data-plane task to the control plane; logged
    /// and counted instead (spec.md §6, §7).
    #[error("transient error: {0}")]
    Transient(String),
}

impl SupervisorError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn resource_busy(message: impl Into<String>) -> Self {
        Self::ResourceBusy(message.into())
    }

    pub fn privilege(message: impl Into<String>) -> Self {
        Self::Privilege(message.into())
    }

    /// A short machine-readable tag for IPC responses and log fields, e.g.
    /// `"err_validation"` (spec.md §7's `Err*` names, snake_cased).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "err_validation",
            Self::DuplicateName { .. } => "err_duplicate_name",
            Self::NotFound(_) => "err_not_found",
            Self::AlreadyRunning(_) => "err_already_running",
            Self::Privilege(_) => "err_privilege",
            Self::ResourceBusy(_) => "err_resource_busy",
            Self::Backend(_) => "err_backend",
            Self::Transient(_) => "err_transient",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
