// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw-Socket Engine server path (spec.md §4.5.2).

use super::packet::{
    build_faketcp_synack_segment, build_icmp_echo_reply_segment, decode_faketcp, decode_icmp,
    decode_raw_udp, Decoded, RawMode,
};
use super::{into_tokio, open_raw_socket};
use crate::error::EngineError;
use socket2::Protocol;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Notify;

const MAX_RAW_READ: usize = 65536;

pub struct ServerConfig {
    pub listen_port: u16,
    pub forward_to: SocketAddrV4,
    pub dscp: u8,
    pub mode: RawMode,
}

fn protocol_for(mode: RawMode) -> Protocol {
    match mode {
        RawMode::FakeTcp => Protocol::TCP,
        RawMode::Icmp => Protocol::ICMPV4,
        RawMode::RawUdp => Protocol::UDP,
    }
}

/// The sockets opened before a server task is spawned, so a bind/permission
/// failure surfaces to the Start caller instead of only the task's own log
/// line (spec.md §4.3: setup errors unwind fully).
pub struct Prepared {
    raw: UdpSocket,
    forward: UdpSocket,
}

/// Opens the raw socket (no `IP_HDRINCL`) and the connected UDP forward
/// socket.
pub async fn prepare(cfg: &ServerConfig) -> Result<Prepared, EngineError> {
    let raw = open_raw_socket(protocol_for(cfg.mode), false).map_err(EngineError::RawSocketFailed)?;
    raw.set_tos(u32::from(super::packet::dscp_to_tos(cfg.dscp)))
        .map_err(EngineError::RawSocketFailed)?;
    raw.set_ttl(64).map_err(EngineError::RawSocketFailed)?;
    let raw = into_tokio(raw).map_err(EngineError::RawSocketFailed)?;

    let forward = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| EngineError::BindFailed("0.0.0.0:0".into(), e))?;
    forward
        .connect(cfg.forward_to)
        .await
        .map_err(|e| EngineError::BindFailed(cfg.forward_to.to_string(), e))?;

    Ok(Prepared { raw, forward })
}

/// Runs the server main loop until `cancel` fires or the raw socket errors
/// out (spec.md §4.5.2, §4.5.3 Running state).
pub async fn run(prepared: Prepared, cfg: ServerConfig, cancel: Arc<Notify>) -> Result<(), EngineError> {
    let Prepared { raw, forward } = prepared;

    let mut buf = vec![0u8; MAX_RAW_READ];

    loop {
        tokio::select! {
            _ = cancel.notified() => {
                tracing::info!("server cancelled, stopping");
                return Ok(());
            }
            recv = raw.recv(&mut buf) => {
                match recv {
                    Ok(n) => {
                        if let Err(e) = dispatch(&raw, &forward, &buf[..n], &cfg).await {
                            tracing::warn!(error = %e, "dropping malformed packet");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "hard raw socket error, terminating tunnel");
                        return Err(EngineError::RawSocketFailed(e));
                    }
                }
            }
        }
    }
}

async fn dispatch(
    raw: &UdpSocket,
    forward: &UdpSocket,
    buf: &[u8],
    cfg: &ServerConfig,
) -> std::io::Result<()> {
    match cfg.mode {
        RawMode::FakeTcp => match decode_faketcp(buf, cfg.listen_port) {
            Ok(Decoded::FakeTcpSyn { src, src_port, dst_port, seq }) => {
                let segment = build_faketcp_synack_segment(Ipv4Addr::UNSPECIFIED, src, dst_port, src_port, seq);
                raw.send_to(&segment, SocketAddr::V4(SocketAddrV4::new(src, 0))).await?;
            }
            Ok(Decoded::FakeTcpData { payload, .. }) => {
                forward.send(&payload).await?;
            }
            Ok(Decoded::FakeTcpOther) => {
                tracing::debug!("dropping unmatched FakeTCP packet");
            }
            Ok(_) | Err(_) => {
                tracing::warn!("malformed FakeTCP packet");
            }
        },
        RawMode::Icmp => match decode_icmp(buf) {
            Ok(Decoded::IcmpEchoRequest { src, id, seq, payload }) => {
                let segment = build_icmp_echo_reply_segment(id, seq, &payload);
                raw.send_to(&segment, SocketAddr::V4(SocketAddrV4::new(src, 0))).await?;
                forward.send(&payload).await?;
            }
            Ok(Decoded::IcmpOther) => {
                tracing::debug!("ignoring non-echo-request ICMP packet");
            }
            Ok(_) | Err(_) => {
                tracing::warn!("malformed ICMP packet");
            }
        },
        RawMode::RawUdp => match decode_raw_udp(buf, cfg.listen_port) {
            Ok(Decoded::RawUdp { payload, .. }) => {
                forward.send(&payload).await?;
            }
            Ok(_) | Err(_) => {
                tracing::debug!("dropping unmatched raw UDP packet");
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
