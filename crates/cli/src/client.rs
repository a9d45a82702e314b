// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::UnixStream;

use tunnel_core::config::{NewTunnelConfig, TunnelPatch};
use tunnel_core::{TunnelConfig, TunnelId, TunnelKind};
use tunnel_daemon::protocol::{self, ProtocolError, Request, Response, TunnelSummary};

use crate::daemon_process::{
    cleanup_stale_socket, daemon_socket, probe_socket, read_startup_error, start_daemon_background,
    stop_daemon_sync, wrap_with_startup_error,
};

fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(2))
}

fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("timed out waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    #[error("unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine state directory")]
    NoStateDir,
}

/// Unix-socket client speaking the daemon's command protocol
/// (`tunnel_daemon::protocol`).
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands (create/start/stop/update/delete): auto-start
    /// the daemon if it isn't running, limited to one restart per process.
    pub fn for_action() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect();
        }

        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    RESTARTED.store(true, Ordering::SeqCst);
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                RESTARTED.store(true, Ordering::SeqCst);
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// For query commands (list/get): connect only, never auto-start.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    /// Connect to an existing daemon (no auto-start).
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    /// Connect to daemon, starting it in the background if not running.
    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error() {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {status}"
                    )));
                }
                Ok(None) => {}
                Err(_) => {}
            }

            match Self::connect() {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => std::thread::sleep(poll_interval()),
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }

    /// Send a request and receive a response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc()).await
    }

    fn reject<T>(resp: Response) -> Result<T, ClientError> {
        match resp {
            Response::Error { code, message } => Err(ClientError::Rejected { code, message }),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// `tunnel.create`
    pub async fn create(&self, config: NewTunnelConfig) -> Result<TunnelConfig, ClientError> {
        match self.send(&Request::Create { config }).await? {
            Response::Tunnel { tunnel } => Ok(tunnel),
            other => Self::reject(other),
        }
    }

    /// `tunnel.start`
    pub async fn start(&self, id: TunnelId) -> Result<(), ClientError> {
        match self.send(&Request::Start { id }).await? {
            Response::Ack => Ok(()),
            other => Self::reject(other),
        }
    }

    /// `tunnel.stop`
    pub async fn stop(&self, id: TunnelId) -> Result<(), ClientError> {
        match self.send(&Request::Stop { id }).await? {
            Response::Ack => Ok(()),
            other => Self::reject(other),
        }
    }

    /// `tunnel.update`
    pub async fn update(&self, id: TunnelId, patch: TunnelPatch) -> Result<(), ClientError> {
        match self.send(&Request::Update { id, patch }).await? {
            Response::Ack => Ok(()),
            other => Self::reject(other),
        }
    }

    /// `tunnel.delete`
    pub async fn delete(&self, id: TunnelId) -> Result<(), ClientError> {
        match self.send(&Request::Delete { id }).await? {
            Response::Ack => Ok(()),
            other => Self::reject(other),
        }
    }

    /// `tunnel.list`
    pub async fn list(&self, kind: Option<TunnelKind>) -> Result<Vec<TunnelSummary>, ClientError> {
        match self.send(&Request::List { kind }).await? {
            Response::List { tunnels } => Ok(tunnels),
            other => Self::reject(other),
        }
    }

    /// `tunnel.get`
    pub async fn get(&self, id: TunnelId) -> Result<TunnelConfig, ClientError> {
        match self.send(&Request::Get { id }).await? {
            Response::Tunnel { tunnel } => Ok(tunnel),
            other => Self::reject(other),
        }
    }

    /// Daemon version via `Hello` handshake.
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: env!("CARGO_PKG_VERSION").to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }
}

/// Stop the daemon synchronously, reporting whether it was running.
pub fn daemon_stop() -> bool {
    let was_running = matches!(
        crate::daemon_process::read_daemon_pid(),
        Ok(Some(pid)) if crate::daemon_process::process_exists(pid)
    );
    stop_daemon_sync();
    was_running
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
