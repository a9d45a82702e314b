// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bit-exact packet crafting and parsing for the raw-socket engine
//! (spec.md §4.5.1, §4.5.2). All checksums are standard IPv4 one's-complement
//! sums; `IP_HDRINCL` means the client path builds the IP header itself,
//! the server path receives it as part of the raw read.

use pnet_packet::icmp::echo_reply::MutableEchoReplyPacket;
use pnet_packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet_packet::icmp::{self, IcmpPacket, IcmpTypes};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{self, Ipv4Flags, Ipv4Packet, MutableIpv4Packet};
use pnet_packet::tcp::{self, MutableTcpPacket, TcpFlags, TcpPacket};
use pnet_packet::udp::{self, MutableUdpPacket, UdpPacket};
use pnet_packet::Packet;
use rand::Rng;
use std::net::Ipv4Addr;

const IPV4_HEADER_LEN: usize = 20;
const TCP_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;
const ICMP_ECHO_HEADER_LEN: usize = 8;

/// Converts spec.md's `dscp` (6-bit) into the IPv4 ToS byte (P6).
pub fn dscp_to_tos(dscp: u8) -> u8 {
    (dscp & 0x3f) << 2
}

/// The three `udp_raw` obfuscation modes (spec.md §3), narrowed from
/// `tunnel_core::Mode` (which also carries the unrelated client/server
/// modes used by `reverse_tcp` and the chisel kinds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawMode {
    FakeTcp,
    Icmp,
    RawUdp,
}

fn random_ephemeral_port() -> u16 {
    rand::rng().random_range(1024..=65535)
}

fn write_ip_header(
    buf: &mut [u8],
    total_len: u16,
    dscp: u8,
    protocol: pnet_packet::ip::IpNextHeaderProtocol,
    src: Ipv4Addr,
    dst: Ipv4Addr,
) {
    // buf is always sized to IPV4_HEADER_LEN + payload by the caller
    #[allow(clippy::expect_used)]
    let mut ip = MutableIpv4Packet::new(buf).expect("buffer sized for IPv4 header");
    ip.set_version(4);
    ip.set_header_length((IPV4_HEADER_LEN / 4) as u8);
    ip.set_dscp(dscp & 0x3f);
    ip.set_ecn(0);
    ip.set_total_length(total_len);
    ip.set_identification(rand::rng().random_range(0..=u16::MAX));
    ip.set_flags(Ipv4Flags::DontFragment);
    ip.set_fragment_offset(0);
    ip.set_ttl(64);
    ip.set_next_level_protocol(protocol);
    ip.set_source(src);
    ip.set_destination(dst);
    let checksum = ipv4::checksum(&ip.to_immutable());
    ip.set_checksum(checksum);
}

/// Builds a FakeTCP SYN packet carrying `payload` as the TCP segment's data
/// (spec.md §4.5.1 table). `src` is the chosen outbound address, or
/// `0.0.0.0` to let the kernel fill it in where permitted.
pub fn build_faketcp_syn(src: Ipv4Addr, dst: Ipv4Addr, dst_port: u16, dscp: u8, payload: &[u8]) -> Vec<u8> {
    let total_len = IPV4_HEADER_LEN + TCP_HEADER_LEN + payload.len();
    let mut buf = vec![0u8; total_len];

    write_ip_header(
        &mut buf,
        total_len as u16,
        dscp,
        IpNextHeaderProtocols::Tcp,
        src,
        dst,
    );

    {
        // buf is sized for IPV4_HEADER_LEN + TCP_HEADER_LEN + payload above
        #[allow(clippy::expect_used)]
        let mut tcp = MutableTcpPacket::new(&mut buf[IPV4_HEADER_LEN..]).expect("tcp buffer sized");
        tcp.set_source(random_ephemeral_port());
        tcp.set_destination(dst_port);
        tcp.set_sequence(rand::rng().random());
        tcp.set_acknowledgement(0);
        tcp.set_data_offset((TCP_HEADER_LEN / 4) as u8);
        tcp.set_flags(TcpFlags::SYN);
        tcp.set_window(14600);
        tcp.set_urgent_ptr(0);
        tcp.set_payload(payload);
        let checksum = tcp::ipv4_checksum(&tcp.to_immutable(), &src, &dst);
        tcp.set_checksum(checksum);
    }

    buf
}

/// Builds the server's SYN-ACK reply to a FakeTCP SYN (spec.md §4.5.2).
pub fn build_faketcp_synack(
    src: Ipv4Addr,
    dst: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    dscp: u8,
    client_seq: u32,
) -> Vec<u8> {
    let total_len = IPV4_HEADER_LEN + TCP_HEADER_LEN;
    let mut buf = vec![0u8; total_len];

    write_ip_header(&mut buf, total_len as u16, dscp, IpNextHeaderProtocols::Tcp, src, dst);

    {
        // buf is sized for IPV4_HEADER_LEN + TCP_HEADER_LEN above
        #[allow(clippy::expect_used)]
        let mut tcp = MutableTcpPacket::new(&mut buf[IPV4_HEADER_LEN..]).expect("tcp buffer sized");
        tcp.set_source(src_port);
        tcp.set_destination(dst_port);
        tcp.set_sequence(rand::rng().random());
        tcp.set_acknowledgement(client_seq.wrapping_add(1));
        tcp.set_data_offset((TCP_HEADER_LEN / 4) as u8);
        tcp.set_flags(TcpFlags::SYN | TcpFlags::ACK);
        tcp.set_window(14600);
        tcp.set_urgent_ptr(0);
        let checksum = tcp::ipv4_checksum(&tcp.to_immutable(), &src, &dst);
        tcp.set_checksum(checksum);
    }

    buf
}

/// Builds just the TCP segment (no IP header) for the server's SYN-ACK
/// reply. The server raw socket does not set `IP_HDRINCL` (spec.md §4.5.2),
/// so the kernel supplies the IP header itself from the socket's TOS/TTL
/// options and the `sendto` destination; `src`/`dst` here are only inputs
/// to the pseudo-header checksum, not written to the wire.
pub fn build_faketcp_synack_segment(src: Ipv4Addr, dst: Ipv4Addr, src_port: u16, dst_port: u16, client_seq: u32) -> Vec<u8> {
    let mut buf = vec![0u8; TCP_HEADER_LEN];
    // buf is sized for TCP_HEADER_LEN above
    #[allow(clippy::expect_used)]
    let mut tcp = MutableTcpPacket::new(&mut buf).expect("tcp buffer sized");
    tcp.set_source(src_port);
    tcp.set_destination(dst_port);
    tcp.set_sequence(rand::rng().random());
    tcp.set_acknowledgement(client_seq.wrapping_add(1));
    tcp.set_data_offset((TCP_HEADER_LEN / 4) as u8);
    tcp.set_flags(TcpFlags::SYN | TcpFlags::ACK);
    tcp.set_window(14600);
    tcp.set_urgent_ptr(0);
    let checksum = tcp::ipv4_checksum(&tcp.to_immutable(), &src, &dst);
    tcp.set_checksum(checksum);
    buf
}

/// Builds just the ICMP Echo Reply segment (no IP header), same rationale
/// as [`build_faketcp_synack_segment`]. ICMP's checksum has no pseudo-header
/// so `src`/`dst` are unused here.
pub fn build_icmp_echo_reply_segment(id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0u8; ICMP_ECHO_HEADER_LEN + payload.len()];
    // buf is sized for ICMP_ECHO_HEADER_LEN + payload above
    #[allow(clippy::expect_used)]
    let mut echo = MutableEchoReplyPacket::new(&mut buf).expect("icmp buffer sized");
    echo.set_icmp_type(IcmpTypes::EchoReply);
    echo.set_icmp_code(icmp::echo_reply::IcmpCodes::NoCode);
    echo.set_identifier(id);
    echo.set_sequence_number(seq);
    echo.set_payload(payload);
    // echo.packet() is the buffer we just constructed above
    #[allow(clippy::expect_used)]
    let checksum = icmp::checksum(&IcmpPacket::new(echo.packet()).expect("just wrote it"));
    echo.set_checksum(checksum);
    buf
}

/// Builds an ICMP Echo Request carrying `payload` (spec.md §4.5.1 table).
pub fn build_icmp_echo_request(src: Ipv4Addr, dst: Ipv4Addr, dscp: u8, id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    let total_len = IPV4_HEADER_LEN + ICMP_ECHO_HEADER_LEN + payload.len();
    let mut buf = vec![0u8; total_len];

    write_ip_header(&mut buf, total_len as u16, dscp, IpNextHeaderProtocols::Icmp, src, dst);

    {
        // buf is sized for IPV4_HEADER_LEN + ICMP_ECHO_HEADER_LEN + payload above
        #[allow(clippy::expect_used)]
        let mut echo =
            MutableEchoRequestPacket::new(&mut buf[IPV4_HEADER_LEN..]).expect("icmp buffer sized");
        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(icmp::echo_request::IcmpCodes::NoCode);
        echo.set_identifier(id);
        echo.set_sequence_number(seq);
        echo.set_payload(payload);
        // echo.packet() is the buffer we just constructed above
        #[allow(clippy::expect_used)]
        let checksum = icmp::checksum(&IcmpPacket::new(echo.packet()).expect("just wrote it"));
        echo.set_checksum(checksum);
    }

    buf
}

/// Builds the server's Echo Reply, mirroring Id/Seq/payload (spec.md §4.5.2, P8).
pub fn build_icmp_echo_reply(src: Ipv4Addr, dst: Ipv4Addr, dscp: u8, id: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    let total_len = IPV4_HEADER_LEN + ICMP_ECHO_HEADER_LEN + payload.len();
    let mut buf = vec![0u8; total_len];

    write_ip_header(&mut buf, total_len as u16, dscp, IpNextHeaderProtocols::Icmp, src, dst);

    {
        // buf is sized for IPV4_HEADER_LEN + ICMP_ECHO_HEADER_LEN + payload above
        #[allow(clippy::expect_used)]
        let mut echo =
            MutableEchoReplyPacket::new(&mut buf[IPV4_HEADER_LEN..]).expect("icmp buffer sized");
        echo.set_icmp_type(IcmpTypes::EchoReply);
        echo.set_icmp_code(icmp::echo_reply::IcmpCodes::NoCode);
        echo.set_identifier(id);
        echo.set_sequence_number(seq);
        echo.set_payload(payload);
        // echo.packet() is the buffer we just constructed above
        #[allow(clippy::expect_used)]
        let checksum = icmp::checksum(&IcmpPacket::new(echo.packet()).expect("just wrote it"));
        echo.set_checksum(checksum);
    }

    buf
}

/// Builds a raw UDP-in-IP packet (spec.md §4.5.1 table, "Raw UDP" column).
pub fn build_raw_udp(src: Ipv4Addr, dst: Ipv4Addr, dst_port: u16, dscp: u8, payload: &[u8]) -> Vec<u8> {
    let total_len = IPV4_HEADER_LEN + UDP_HEADER_LEN + payload.len();
    let mut buf = vec![0u8; total_len];

    write_ip_header(&mut buf, total_len as u16, dscp, IpNextHeaderProtocols::Udp, src, dst);

    {
        // buf is sized for IPV4_HEADER_LEN + UDP_HEADER_LEN + payload above
        #[allow(clippy::expect_used)]
        let mut udp_packet =
            MutableUdpPacket::new(&mut buf[IPV4_HEADER_LEN..]).expect("udp buffer sized");
        udp_packet.set_source(random_ephemeral_port());
        udp_packet.set_destination(dst_port);
        udp_packet.set_length((UDP_HEADER_LEN + payload.len()) as u16);
        udp_packet.set_payload(payload);
        let checksum = udp::ipv4_checksum(&udp_packet.to_immutable(), &src, &dst);
        udp_packet.set_checksum(checksum);
    }

    buf
}

/// A decoded inbound raw IPv4 packet, classified by `mode` (spec.md §4.5.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    FakeTcpSyn {
        src: Ipv4Addr,
        src_port: u16,
        dst_port: u16,
        seq: u32,
    },
    FakeTcpData {
        src: Ipv4Addr,
        dst_port: u16,
        payload: Vec<u8>,
    },
    FakeTcpOther,
    IcmpEchoRequest {
        src: Ipv4Addr,
        id: u16,
        seq: u16,
        payload: Vec<u8>,
    },
    IcmpOther,
    RawUdp {
        src: Ipv4Addr,
        dst_port: u16,
        payload: Vec<u8>,
    },
    RawUdpOther,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("packet shorter than an IPv4 header")]
    TooShort,
    #[error("unrecognized IP payload")]
    Malformed,
}

/// Parses a FakeTCP-mode inbound packet (spec.md §4.5.2 "FakeTCP" bullet).
/// `listen_port` filters by `TCP.dst_port`.
pub fn decode_faketcp(buf: &[u8], listen_port: u16) -> Result<Decoded, DecodeError> {
    let ip = Ipv4Packet::new(buf).ok_or(DecodeError::TooShort)?;
    let tcp = TcpPacket::new(ip.payload()).ok_or(DecodeError::Malformed)?;
    if tcp.get_destination() != listen_port {
        return Ok(Decoded::FakeTcpOther);
    }
    let flags = tcp.get_flags();
    let syn = flags & TcpFlags::SYN != 0;
    let ack = flags & TcpFlags::ACK != 0;
    if syn && !ack {
        return Ok(Decoded::FakeTcpSyn {
            src: ip.get_source(),
            src_port: tcp.get_source(),
            dst_port: tcp.get_destination(),
            seq: tcp.get_sequence(),
        });
    }
    if ack && !tcp.payload().is_empty() {
        return Ok(Decoded::FakeTcpData {
            src: ip.get_source(),
            dst_port: tcp.get_destination(),
            payload: tcp.payload().to_vec(),
        });
    }
    Ok(Decoded::FakeTcpOther)
}

/// Parses an ICMP-mode inbound packet (spec.md §4.5.2 "ICMP" bullet).
pub fn decode_icmp(buf: &[u8]) -> Result<Decoded, DecodeError> {
    let ip = Ipv4Packet::new(buf).ok_or(DecodeError::TooShort)?;
    let icmp = IcmpPacket::new(ip.payload()).ok_or(DecodeError::Malformed)?;
    if icmp.get_icmp_type() != IcmpTypes::EchoRequest {
        return Ok(Decoded::IcmpOther);
    }
    let echo = EchoRequestPacket::new(ip.payload()).ok_or(DecodeError::Malformed)?;
    let payload = echo.payload().to_vec();
    if payload.is_empty() {
        return Ok(Decoded::IcmpOther);
    }
    Ok(Decoded::IcmpEchoRequest {
        src: ip.get_source(),
        id: echo.get_identifier(),
        seq: echo.get_sequence_number(),
        payload,
    })
}

/// Parses a Raw-UDP-mode inbound packet (spec.md §4.5.2 "Raw UDP" bullet).
/// `listen_port` filters by `UDP.dst_port`.
pub fn decode_raw_udp(buf: &[u8], listen_port: u16) -> Result<Decoded, DecodeError> {
    let ip = Ipv4Packet::new(buf).ok_or(DecodeError::TooShort)?;
    let udp_packet = UdpPacket::new(ip.payload()).ok_or(DecodeError::Malformed)?;
    if udp_packet.get_destination() != listen_port {
        return Ok(Decoded::RawUdpOther);
    }
    Ok(Decoded::RawUdp {
        src: ip.get_source(),
        dst_port: udp_packet.get_destination(),
        payload: udp_packet.payload().to_vec(),
    })
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
