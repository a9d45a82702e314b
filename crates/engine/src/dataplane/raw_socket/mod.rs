// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Raw-Socket Engine (C5, spec.md §4.5): packet crafting/parsing plus the
//! client and server main loops for the `udp_raw` tunnel kind.

pub mod client;
pub mod packet;
pub mod server;

use socket2::{Domain, Protocol, Socket, Type};
use std::io;

/// Opens a raw IPv4 socket with `IP_HDRINCL` set (client path, spec.md
/// §4.5.1 steps 2-4) or unset (server path, §4.5.2), matching the protocol
/// the given mode filters on.
fn open_raw_socket(protocol: Protocol, hdrincl: bool) -> io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(protocol))?;
    socket.set_nonblocking(true)?;
    if hdrincl {
        socket.set_header_included_v4(true)?;
    }
    Ok(socket)
}

/// Converts a raw, non-blocking `socket2::Socket` into a `tokio::net::UdpSocket`
/// so the data-plane task can `.recv()`/`.send_to()` it with the usual tokio
/// reactor integration; `SOCK_RAW` sockets support the same recv/send
/// syscalls as `SOCK_DGRAM` ones at this level.
fn into_tokio(socket: Socket) -> io::Result<tokio::net::UdpSocket> {
    tokio::net::UdpSocket::from_std(socket.into())
}
