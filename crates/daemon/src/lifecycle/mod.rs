// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod reconcile;
pub(crate) use reconcile::reconcile_at_startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use fs2::FileExt;
use tunnel_adapters::process::SpawnedProcessAdapter;
use tunnel_adapters::link::OsLinkAdapter;
use tunnel_adapters::traced::{TracedLink, TracedProcess};
use tunnel_engine::{Driver, Registry};
use tunnel_storage::{ConfigStore, StoreError};

/// Concrete `Driver` wired to the real process/link adapters (wrapped with
/// tracing), the type the daemon binary actually runs.
pub type TunnelDriver = Driver<TracedProcess<SpawnedProcessAdapter>, TracedLink<OsLinkAdapter>>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/tunneld)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Directory the Config Store keeps its WAL and snapshot under
    pub store_dir: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under `~/.local/state/tunneld/` (or
    /// `$XDG_STATE_HOME/tunneld/`). One daemon serves every tunnel for a user
    /// (spec.md §2, §6).
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            store_dir: state_dir.join("store"),
            state_dir,
        })
    }
}

/// Daemon state during operation. The listener is returned separately from
/// startup to be spawned as a task.
pub struct DaemonState {
    pub config: Config,
    // Held to maintain the exclusive file lock; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    pub store: Arc<ConfigStore>,
    pub driver: Arc<TunnelDriver>,
}

/// Result of daemon startup - includes both the daemon state and the listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

impl DaemonState {
    /// Shutdown the daemon gracefully.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // Synchronous checkpoint so next startup doesn't need to replay the
        // whole WAL (spec.md §4.3's durability ordering).
        if let Err(e) = self.store.checkpoint_sync() {
            warn!("Failed to save shutdown snapshot: {}", e);
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("Failed to remove version file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine error: {0}")]
    Engine(#[from] tunnel_engine::EngineError),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock —
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Acquire lock file first, before touching anything else, to avoid races
    // with another daemon starting concurrently.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // Open the Config Store: loads the latest snapshot (if any) and replays
    // any WAL entries after it (spec.md §4.3).
    let store = Arc::new(ConfigStore::open(&config.store_dir)?);
    info!(tunnels = store.list().len(), "loaded config store");

    let registry = Arc::new(Registry::new());
    let process = TracedProcess::new(SpawnedProcessAdapter::new());
    let link = TracedLink::new(OsLinkAdapter::new());
    let driver = Arc::new(Driver::new(Arc::clone(&store), registry, process, link));

    // Reconcile persisted `running` rows against reality before accepting
    // any commands (spec.md §4.2).
    reconcile_at_startup(&driver).await?;

    // Bind socket last, only after all validation passes.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("Daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            store,
            driver,
        },
        listener,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
