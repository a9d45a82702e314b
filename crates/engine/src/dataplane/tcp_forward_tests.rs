// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[tokio::test]
async fn reverse_tcp_forwards_bytes_both_ways() {
    let target_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target_addr = target_listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = target_listener.accept().await.unwrap();
        let mut buf = [0u8; 5];
        sock.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
        sock.write_all(b"world").await.unwrap();
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listen_addr = listener.local_addr().unwrap();

    let cancel = Arc::new(Notify::new());
    let cancel_clone = cancel.clone();
    let task = tokio::spawn(run_reverse_tcp(
        listener,
        ReverseTcpConfig { target: target_addr },
        cancel_clone,
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut client = TcpStream::connect(listen_addr).await.unwrap();
    client.write_all(b"hello").await.unwrap();
    let mut reply = [0u8; 5];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"world");

    cancel.notify_waiters();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn mtproto_relay_forwards_handshake_then_relays() {
    let dc_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dc_addr = dc_listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = dc_listener.accept().await.unwrap();
        let mut handshake = [0u8; MTPROTO_MIN_HANDSHAKE_LEN];
        sock.read_exact(&mut handshake).await.unwrap();
        assert_eq!(&handshake[..], &[0xAAu8; MTPROTO_MIN_HANDSHAKE_LEN][..]);
        sock.write_all(b"ack").await.unwrap();
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listen_addr = listener.local_addr().unwrap();

    let cancel = Arc::new(Notify::new());
    let cancel_clone = cancel.clone();
    let task = tokio::spawn(run_mtproto(
        listener,
        MtprotoConfig { dc_target: dc_addr },
        cancel_clone,
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut client = TcpStream::connect(listen_addr).await.unwrap();
    client.write_all(&[0xAAu8; MTPROTO_MIN_HANDSHAKE_LEN]).await.unwrap();
    let mut reply = [0u8; 3];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"ack");

    cancel.notify_waiters();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn mtproto_relay_times_out_on_short_handshake() {
    let dc_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dc_addr = dc_listener.local_addr().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listen_addr = listener.local_addr().unwrap();

    let cancel = Arc::new(Notify::new());
    let cancel_clone = cancel.clone();
    let task = tokio::spawn(run_mtproto(
        listener,
        MtprotoConfig { dc_target: dc_addr },
        cancel_clone,
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut client = TcpStream::connect(listen_addr).await.unwrap();
    client.write_all(b"short").await.unwrap();
    drop(client);

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.notify_waiters();
    task.await.unwrap().unwrap();
}
