// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tunnel daemon` — lifecycle management for `tunneld`.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::Command;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::{daemon_stop, DaemonClient};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct DaemonArgsCli {
    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (foreground or background)
    Start {
        /// Run in the foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status
    Status,
    /// View daemon logs
    Logs {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
}

pub async fn handle(command: Option<DaemonCommand>, format: OutputFormat) -> Result<()> {
    match command {
        Some(DaemonCommand::Start { foreground }) => start(foreground).await,
        Some(DaemonCommand::Stop) => stop().await,
        Some(DaemonCommand::Status) => status(format).await,
        Some(DaemonCommand::Logs { limit, no_limit }) => logs(limit, no_limit).await,
        None => status(format).await,
    }
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let status = Command::new(find_tunneld_binary()).status()?;
        if !status.success() {
            return Err(anyhow!("daemon exited with status: {status}"));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if client.hello().await.is_ok() {
            println!("daemon already running");
            return Ok(());
        }
    }

    DaemonClient::connect_or_start().map_err(|e| anyhow!("{e}"))?;
    println!("daemon started");
    Ok(())
}

async fn stop() -> Result<()> {
    if daemon_stop() {
        println!("daemon stopped");
    } else {
        println!("daemon not running");
    }
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let not_running = |format: OutputFormat| match format {
        OutputFormat::Text => println!("daemon not running"),
        OutputFormat::Json => println!(r#"{{"status":"not_running"}}"#),
    };

    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(_) => {
            not_running(format);
            return Ok(());
        }
    };

    let version = match client.hello().await {
        Ok(v) => v,
        Err(_) => {
            not_running(format);
            return Ok(());
        }
    };

    match format {
        OutputFormat::Text => {
            println!("status: running");
            println!("version: {version}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "status": "running", "version": version }));
        }
    }
    Ok(())
}

async fn logs(limit: usize, no_limit: bool) -> Result<()> {
    let log_path = crate::env::state_dir().map_err(|e| anyhow!("{e}"))?.join("daemon.log");
    if !log_path.exists() {
        println!("no log file found at {}", log_path.display());
        return Ok(());
    }
    if no_limit {
        print!("{}", std::fs::read_to_string(&log_path)?);
    } else {
        print!("{}", read_last_lines(&log_path, limit)?);
    }
    Ok(())
}

fn read_last_lines(path: &std::path::Path, n: usize) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

fn find_tunneld_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("tunneld");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("tunneld")
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
