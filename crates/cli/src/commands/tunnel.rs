// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tunnel create/start/stop/update/delete/list/get` — the CLI surface over
//! the daemon's `tunnel.*` command API.

use anyhow::{anyhow, Result};
use clap::{Subcommand, ValueEnum};

use tunnel_core::config::{NewTunnelConfig, TunnelPatch};
use tunnel_core::{Endpoint, Secret, TunnelArgs, TunnelId};

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use crate::table::Table;

#[derive(Subcommand)]
pub enum TunnelCommand {
    /// Register a new tunnel (stopped until `start` is run)
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// `host:port` to listen on
        #[arg(long)]
        listen: Endpoint,
        /// `host:port` to reach, where the kind requires one
        #[arg(long)]
        remote: Option<Endpoint>,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
        /// Hex-encoded secret (mtproto requires exactly 32 bytes / 64 hex chars)
        #[arg(long)]
        secret: Option<String>,
        #[arg(long, default_value_t = 0)]
        dscp: u8,
        /// Extra `key=value` args (repeatable), e.g. `--arg iface_name=tun7`
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },
    /// Start a stopped tunnel
    Start { id: u64 },
    /// Stop a running tunnel (idempotent)
    Stop { id: u64 },
    /// Change a stopped tunnel's configuration
    Update {
        id: u64,
        #[arg(long)]
        listen: Option<Endpoint>,
        #[arg(long)]
        remote: Option<Endpoint>,
        #[arg(long)]
        clear_remote: bool,
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
        #[arg(long)]
        secret: Option<String>,
        #[arg(long)]
        clear_secret: bool,
        #[arg(long)]
        dscp: Option<u8>,
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,
    },
    /// Stop (if running) and delete a tunnel
    Delete { id: u64 },
    /// List registered tunnels
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Show a tunnel's full configuration
    Get { id: u64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    ReverseTcp,
    Mtproto,
    UdpRaw,
    Gre,
    Tap,
    ChiselClient,
    ChiselServer,
}

impl From<KindArg> for tunnel_core::TunnelKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::ReverseTcp => Self::ReverseTcp,
            KindArg::Mtproto => Self::Mtproto,
            KindArg::UdpRaw => Self::UdpRaw,
            KindArg::Gre => Self::Gre,
            KindArg::Tap => Self::Tap,
            KindArg::ChiselClient => Self::ChiselClient,
            KindArg::ChiselServer => Self::ChiselServer,
        }
    }
}

impl From<tunnel_core::TunnelKind> for KindArg {
    fn from(k: tunnel_core::TunnelKind) -> Self {
        match k {
            tunnel_core::TunnelKind::ReverseTcp => Self::ReverseTcp,
            tunnel_core::TunnelKind::Mtproto => Self::Mtproto,
            tunnel_core::TunnelKind::UdpRaw => Self::UdpRaw,
            tunnel_core::TunnelKind::Gre => Self::Gre,
            tunnel_core::TunnelKind::Tap => Self::Tap,
            tunnel_core::TunnelKind::ChiselClient => Self::ChiselClient,
            tunnel_core::TunnelKind::ChiselServer => Self::ChiselServer,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    FakeTcp,
    Icmp,
    RawUdp,
    Client,
    Server,
}

impl From<ModeArg> for tunnel_core::Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::FakeTcp => Self::FakeTcp,
            ModeArg::Icmp => Self::Icmp,
            ModeArg::RawUdp => Self::RawUdp,
            ModeArg::Client => Self::Client,
            ModeArg::Server => Self::Server,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    Client,
    Server,
}

impl From<RoleArg> for tunnel_core::Role {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Client => Self::Client,
            RoleArg::Server => Self::Server,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s.find('=').ok_or_else(|| format!("invalid input format '{s}': must be key=value"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn parse_secret(hex: &str) -> Result<Secret> {
    Secret::from_hex(hex).map_err(|e| anyhow!("{e}"))
}

fn build_args(pairs: Vec<(String, String)>) -> TunnelArgs {
    pairs.into_iter().fold(TunnelArgs::new(), |acc, (k, v)| acc.with(k, v))
}

pub async fn handle(command: TunnelCommand, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match command {
        TunnelCommand::Create { name, kind, listen, remote, mode, role, secret, dscp, args } => {
            let secret = secret.map(|s| parse_secret(&s)).transpose()?;
            let new = NewTunnelConfig {
                name,
                kind: kind.into(),
                listen_endpoint: listen,
                remote_endpoint: remote,
                mode: mode.map(Into::into),
                role: role.map(Into::into),
                secret,
                dscp,
                args: build_args(args),
            };
            new.validate().map_err(|e| anyhow!("{e}"))?;
            let tunnel = client.create(new).await.map_err(|e| anyhow!("{e}"))?;
            print_tunnel(&tunnel, format)
        }
        TunnelCommand::Start { id } => {
            client.start(TunnelId(id)).await.map_err(|e| anyhow!("{e}"))?;
            print_ack("started", id, format)
        }
        TunnelCommand::Stop { id } => {
            client.stop(TunnelId(id)).await.map_err(|e| anyhow!("{e}"))?;
            print_ack("stopped", id, format)
        }
        TunnelCommand::Update { id, listen, remote, clear_remote, mode, role, secret, clear_secret, dscp, args } => {
            let secret = secret.map(|s| parse_secret(&s)).transpose()?;
            let patch = TunnelPatch {
                listen_endpoint: listen,
                remote_endpoint: if clear_remote { Some(None) } else { remote.map(Some) },
                mode: mode.map(Into::into),
                role: role.map(Into::into),
                secret: if clear_secret { Some(None) } else { secret.map(Some) },
                dscp,
                args: if args.is_empty() { None } else { Some(build_args(args)) },
            };
            patch.validate().map_err(|e| anyhow!("{e}"))?;
            client.update(TunnelId(id), patch).await.map_err(|e| anyhow!("{e}"))?;
            print_ack("updated", id, format)
        }
        TunnelCommand::Delete { id } => {
            client.delete(TunnelId(id)).await.map_err(|e| anyhow!("{e}"))?;
            print_ack("deleted", id, format)
        }
        TunnelCommand::List { kind } => {
            let tunnels = client.list(kind.map(Into::into)).await.map_err(|e| anyhow!("{e}"))?;
            print_list(&tunnels, format)
        }
        TunnelCommand::Get { id } => {
            let tunnel = client.get(TunnelId(id)).await.map_err(|e| anyhow!("{e}"))?;
            print_tunnel(&tunnel, format)
        }
    }
}

fn print_ack(verb: &str, id: u64, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("tunnel {id} {verb}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "id": id, "status": verb })),
    }
    Ok(())
}

fn print_tunnel(tunnel: &tunnel_core::TunnelConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("id:              {}", tunnel.id);
            println!("name:            {}", tunnel.name);
            println!("kind:            {}", tunnel.kind.as_str());
            println!("status:          {:?}", tunnel.status);
            println!("listen_endpoint: {}", tunnel.listen_endpoint);
            println!(
                "remote_endpoint: {}",
                tunnel.remote_endpoint.map(|e| e.to_string()).unwrap_or_else(|| "-".into())
            );
            println!("dscp:            {}", tunnel.dscp);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tunnel)?),
    }
    Ok(())
}

fn print_list(tunnels: &[tunnel_daemon::protocol::TunnelSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if tunnels.is_empty() {
                println!("No tunnels registered.");
                return Ok(());
            }
            let mut table = Table::new(vec!["ID", "NAME", "KIND", "STATUS", "LISTEN", "REMOTE"]);
            for t in tunnels {
                table.row(vec![
                    t.id.to_string(),
                    t.name.clone(),
                    t.kind.as_str().to_string(),
                    format!("{:?}", t.status),
                    t.listen_endpoint.to_string(),
                    t.remote_endpoint.map(|e| e.to_string()).unwrap_or_else(|| "-".into()),
                ]);
            }
            print!("{}", table.render());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tunnels)?),
    }
    Ok(())
}

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
