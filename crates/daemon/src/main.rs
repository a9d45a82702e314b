// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunnel Supervisor daemon (tunneld)
//!
//! Background process that owns the Config Store, the Lifecycle Driver, and
//! the Unix-socket Command API (spec.md §2, §6).
//!
//! Architecture:
//! - Listener task: spawned task handling socket I/O, one request/response
//!   round trip per connection.
//! - Main task: waits on shutdown signals and drives the periodic
//!   checkpoint backstop.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod lifecycle;
mod listener;
mod protocol;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("tunneld {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("tunneld {}", env!("CARGO_PKG_VERSION"));
                println!("Tunnel Supervisor daemon - owns the config store and drives tunnel lifecycle");
                println!();
                println!("USAGE:");
                println!("    tunneld");
                println!();
                println!("The daemon is typically started by the `tunnel` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: tunneld [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("Starting tunnel supervisor daemon");

    let StartupResult { mut daemon, listener: unix_listener } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path).unwrap_or_default();
            eprintln!("tunneld is already running");
            if !pid.trim().is_empty() {
                eprintln!("  pid: {}", pid.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());

    let ctx = Arc::new(ListenCtx { driver: Arc::clone(&daemon.driver), shutdown: Arc::clone(&shutdown_notify) });
    let listener = Listener::new(unix_listener, ctx);
    tokio::spawn(listener.run());

    spawn_checkpoint_task(Arc::clone(&daemon.store));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready, listening on {}", config.socket_path.display());
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown()?;
    info!("Daemon stopped");
    Ok(())
}

/// Checkpoint interval backstop (spec.md §4, `[FULL] 4`): the Config Store
/// already self-checkpoints every 500 events; this task bounds recovery
/// time for low-traffic daemons that rarely cross that threshold.
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(300);

fn spawn_checkpoint_task(store: Arc<tunnel_storage::ConfigStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = store.checkpoint() {
                tracing::warn!(error = %e, "periodic checkpoint failed");
            }
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`]. Best-effort:
/// rotation failures are silently ignored so the daemon still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }
    let _ = std::fs::rename(log_path, format!("{}.1", log_path.display()));
}

const STARTUP_MARKER_PREFIX: &str = "--- tunneld: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;
    rotate_log_if_needed(&config.log_path);
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&config.log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
