// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tunnel - Tunnel Supervisor CLI

mod client;
mod commands;
mod daemon_process;
mod env;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};

use client::DaemonClient;
use commands::daemon::DaemonArgsCli;
use commands::tunnel::TunnelCommand;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "tunnel", version, about = "Tunnel Supervisor - manage reverse tunnels, MTProto proxies, and raw-socket links")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// `tunnel.create/start/stop/update/delete/list/get`
    #[command(flatten)]
    Tunnel(TunnelCommand),
    /// Daemon management
    Daemon(DaemonArgsCli),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    match cli.command {
        Commands::Daemon(args) => commands::daemon::handle(args.command, format).await,
        Commands::Tunnel(cmd) => {
            let client = match &cmd {
                TunnelCommand::List { .. } | TunnelCommand::Get { .. } => DaemonClient::for_query()?,
                _ => DaemonClient::for_action()?,
            };
            commands::tunnel::handle(cmd, &client, format).await
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
