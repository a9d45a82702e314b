// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw-Socket Engine client path (spec.md §4.5.1).

use super::packet::{build_faketcp_syn, build_icmp_echo_request, build_raw_udp, RawMode};
use super::{into_tokio, open_raw_socket};
use crate::error::EngineError;
use rand::Rng;
use socket2::Protocol;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::Notify;

const MAX_UDP_DATAGRAM: usize = 1500;
const IP_TCP_OVERHEAD: usize = 20 + 20;
const IP_ICMP_OVERHEAD: usize = 20 + 8;
const IP_UDP_OVERHEAD: usize = 20 + 8;

pub struct ClientConfig {
    pub listen_port: u16,
    pub dst: SocketAddrV4,
    pub dscp: u8,
    pub mode: RawMode,
}

/// Learns the address the kernel would route through to reach `dst`, so the
/// crafted IP header carries an explicit, routable source (spec.md §4.5.1:
/// "the engine writes an explicit source when it has one").
fn local_outbound_addr(dst: Ipv4Addr) -> std::io::Result<Ipv4Addr> {
    let probe = std::net::UdpSocket::bind("0.0.0.0:0")?;
    probe.connect((dst, 1))?;
    match probe.local_addr()?.ip() {
        std::net::IpAddr::V4(v4) => Ok(v4),
        std::net::IpAddr::V6(_) => Ok(Ipv4Addr::UNSPECIFIED),
    }
}

/// The sockets opened before a client task is spawned, so a bind/permission
/// failure surfaces to the Start caller instead of only the task's own log
/// line (spec.md §4.3: setup errors unwind fully).
pub struct Prepared {
    listener: UdpSocket,
    raw: UdpSocket,
}

/// Binds the local UDP listener and opens the `IP_HDRINCL` raw socket.
pub async fn prepare(cfg: &ClientConfig) -> Result<Prepared, EngineError> {
    let listener = UdpSocket::bind(("127.0.0.1", cfg.listen_port))
        .await
        .map_err(|e| EngineError::BindFailed(format!("127.0.0.1:{}", cfg.listen_port), e))?;

    let raw = open_raw_socket(Protocol::from(libc::IPPROTO_RAW), true)
        .map_err(EngineError::RawSocketFailed)?;
    let raw = into_tokio(raw).map_err(EngineError::RawSocketFailed)?;

    Ok(Prepared { listener, raw })
}

/// Runs the client main loop until `cancel` fires or a hard UDP error occurs
/// (spec.md §4.5.1, §4.5.3 Running state).
pub async fn run(prepared: Prepared, cfg: ClientConfig, cancel: Arc<Notify>) -> Result<(), EngineError> {
    let Prepared { listener, raw } = prepared;

    let src = local_outbound_addr(*cfg.dst.ip()).unwrap_or(Ipv4Addr::UNSPECIFIED);
    let max_payload = match cfg.mode {
        RawMode::FakeTcp => MAX_UDP_DATAGRAM - IP_TCP_OVERHEAD,
        RawMode::Icmp => MAX_UDP_DATAGRAM - IP_ICMP_OVERHEAD,
        RawMode::RawUdp => MAX_UDP_DATAGRAM - IP_UDP_OVERHEAD,
    };

    let dest = SocketAddr::V4(SocketAddrV4::new(*cfg.dst.ip(), 0));
    let mut buf = vec![0u8; MAX_UDP_DATAGRAM];

    loop {
        tokio::select! {
            _ = cancel.notified() => {
                tracing::info!("client cancelled, stopping");
                return Ok(());
            }
            recv = listener.recv(&mut buf) => {
                match recv {
                    Ok(n) => {
                        if n > max_payload {
                            tracing::warn!(n, max_payload, "dropping oversized datagram (DF set, no fragmentation)");
                            continue;
                        }
                        let payload = &buf[..n];
                        let packet = match cfg.mode {
                            RawMode::FakeTcp => build_faketcp_syn(src, *cfg.dst.ip(), cfg.dst.port(), cfg.dscp, payload),
                            RawMode::Icmp => {
                                let id: u16 = rand::rng().random();
                                let seq: u16 = rand::rng().random();
                                build_icmp_echo_request(src, *cfg.dst.ip(), cfg.dscp, id, seq, payload)
                            }
                            RawMode::RawUdp => {
                                build_raw_udp(src, *cfg.dst.ip(), cfg.dst.port(), cfg.dscp, payload)
                            }
                        };
                        if let Err(e) = raw.send_to(&packet, dest).await {
                            tracing::warn!(error = %e, "sendto failed, continuing");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "hard UDP read error, terminating tunnel");
                        return Err(EngineError::RawSocketFailed(e));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
