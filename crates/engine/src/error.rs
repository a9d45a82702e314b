// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-local errors, converging into [`tunnel_core::SupervisorError`] at
//! every public boundary (§7).

use thiserror::Error;
use tunnel_adapters::{LinkError, ProcessError};
use tunnel_core::SupervisorError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Supervisor(#[from] SupervisorError),

    #[error("failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("failed to open raw socket: {0}")]
    RawSocketFailed(std::io::Error),

    #[error("malformed packet: {0}")]
    MalformedPacket(String),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<EngineError> for SupervisorError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Supervisor(inner) => inner,
            EngineError::BindFailed(addr, io) => {
                if io.kind() == std::io::ErrorKind::AddrInUse {
                    SupervisorError::resource_busy(format!("address in use: {addr}"))
                } else if io.kind() == std::io::ErrorKind::PermissionDenied {
                    SupervisorError::privilege(format!("cannot bind {addr}: {io}"))
                } else {
                    SupervisorError::backend(format!("bind {addr} failed: {io}"))
                }
            }
            EngineError::RawSocketFailed(io) => {
                if io.kind() == std::io::ErrorKind::PermissionDenied {
                    SupervisorError::privilege(format!("raw socket denied: {io}"))
                } else {
                    SupervisorError::backend(format!("raw socket failed: {io}"))
                }
            }
            EngineError::MalformedPacket(msg) => SupervisorError::transient(msg),
            EngineError::Link(LinkError::NotFound(name)) => {
                SupervisorError::backend(format!("interface not found: {name}"))
            }
            EngineError::Link(LinkError::AlreadyExists(name)) => {
                SupervisorError::resource_busy(format!("interface already exists: {name}"))
            }
            EngineError::Link(LinkError::Privilege) => {
                SupervisorError::privilege("insufficient privilege to manage kernel interfaces".into())
            }
            EngineError::Link(LinkError::CommandFailed(msg)) => SupervisorError::backend(msg),
            EngineError::Process(ProcessError::NotFound(name)) => {
                SupervisorError::backend(format!("process not found: {name}"))
            }
            EngineError::Process(ProcessError::SpawnFailed(msg)) => SupervisorError::backend(msg),
            EngineError::Process(ProcessError::CommandFailed(msg)) => SupervisorError::backend(msg),
        }
    }
}
