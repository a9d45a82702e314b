// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dataplane::raw_socket::packet::{build_faketcp_synack_segment, build_icmp_echo_reply_segment};
use pnet_packet::icmp::IcmpPacket;
use pnet_packet::tcp::TcpPacket;
use pnet_packet::Packet;
use std::net::Ipv4Addr;

#[test]
fn faketcp_synack_segment_has_no_ip_header() {
    let segment = build_faketcp_synack_segment(Ipv4Addr::UNSPECIFIED, Ipv4Addr::new(10, 0, 0, 2), 443, 51000, 1000);
    let tcp = TcpPacket::new(&segment).unwrap();
    assert_eq!(tcp.get_source(), 443);
    assert_eq!(tcp.get_destination(), 51000);
    assert_eq!(tcp.get_acknowledgement(), 1001);
}

#[test]
fn icmp_echo_reply_segment_mirrors_id_and_seq() {
    let segment = build_icmp_echo_reply_segment(0x1234, 0x0001, b"HELLO");
    let icmp = IcmpPacket::new(&segment).unwrap();
    assert_eq!(icmp.get_icmp_type(), pnet_packet::icmp::IcmpTypes::EchoReply);
    assert_eq!(icmp.payload(), b"HELLO");
}

/// Opening a raw socket with no `IP_HDRINCL` needs `NET_RAW`; only exercised
/// in a privileged CI job.
#[tokio::test]
#[ignore = "requires NET_RAW"]
async fn run_exits_cleanly_on_cancel() {
    let cfg = ServerConfig {
        listen_port: 11080,
        forward_to: "127.0.0.1:9000".parse().unwrap(),
        dscp: 46,
        mode: RawMode::FakeTcp,
    };
    let prepared = prepare(&cfg).await.unwrap();
    let cancel = std::sync::Arc::new(tokio::sync::Notify::new());
    let cancel_clone = cancel.clone();
    let task = tokio::spawn(run(prepared, cfg, cancel_clone));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel.notify_waiters();
    task.await.unwrap().unwrap();
}
