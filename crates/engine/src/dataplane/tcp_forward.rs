// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP Forwarder (C4, spec.md §4.4): the embedded listener + bidirectional
//! copy shared by `reverse_tcp` and the embedded MTProto relay.

use crate::error::EngineError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MTPROTO_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const MTPROTO_MIN_HANDSHAKE_LEN: usize = 64;
const MTPROTO_BUFFER: usize = 32 * 1024;
const REVERSE_TCP_BUFFER: usize = 8 * 1024;

pub struct ReverseTcpConfig {
    pub target: SocketAddr,
}

/// Binds the reverse-TCP listener. Split out of [`run_reverse_tcp`] so a
/// bind failure surfaces to the caller synchronously, before any task is
/// spawned (spec.md §4.3: setup errors unwind fully).
pub async fn bind_reverse_tcp(listen: SocketAddr) -> Result<TcpListener, EngineError> {
    TcpListener::bind(listen)
        .await
        .map_err(|e| EngineError::BindFailed(listen.to_string(), e))
}

/// Plain reverse-TCP bridge: accept, dial `target`, copy both ways
/// (spec.md §4.4 paragraph 1).
pub async fn run_reverse_tcp(listener: TcpListener, cfg: ReverseTcpConfig, cancel: Arc<Notify>) -> Result<(), EngineError> {
    loop {
        tokio::select! {
            _ = cancel.notified() => {
                tracing::info!("reverse_tcp cancelled, stopping");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (conn, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed, continuing");
                        continue;
                    }
                };
                let target = cfg.target;
                tokio::spawn(async move {
                    if let Err(e) = relay_to(conn, target, &[], REVERSE_TCP_BUFFER).await {
                        tracing::debug!(%peer, error = %e, "connection closed");
                    }
                });
            }
        }
    }
}

pub struct MtprotoConfig {
    pub dc_target: SocketAddr,
}

/// Binds the MTProto listener; see [`bind_reverse_tcp`] for why this is
/// split out of [`run_mtproto`].
pub async fn bind_mtproto(listen: SocketAddr) -> Result<TcpListener, EngineError> {
    TcpListener::bind(listen)
        .await
        .map_err(|e| EngineError::BindFailed(listen.to_string(), e))
}

/// Embedded MTProto relay (spec.md §4.4 paragraph 2). The handshake is
/// accepted unconditionally in this tier; see SPEC_FULL.md §6 for the
/// authenticity decision.
pub async fn run_mtproto(listener: TcpListener, cfg: MtprotoConfig, cancel: Arc<Notify>) -> Result<(), EngineError> {
    loop {
        tokio::select! {
            _ = cancel.notified() => {
                tracing::info!("mtproto cancelled, stopping");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (conn, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed, continuing");
                        continue;
                    }
                };
                let target = cfg.dc_target;
                tokio::spawn(async move {
                    if let Err(e) = handle_mtproto_connection(conn, target).await {
                        tracing::debug!(%peer, error = %e, "mtproto connection closed");
                    }
                });
            }
        }
    }
}

async fn handle_mtproto_connection(mut conn: TcpStream, target: SocketAddr) -> std::io::Result<()> {
    let mut handshake = vec![0u8; MTPROTO_MIN_HANDSHAKE_LEN];
    tokio::time::timeout(MTPROTO_HANDSHAKE_TIMEOUT, conn.read_exact(&mut handshake))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "mtproto handshake timed out"))??;
    relay_to(conn, target, &handshake, MTPROTO_BUFFER).await
}

async fn relay_to(mut conn: TcpStream, target: SocketAddr, initial: &[u8], buf_size: usize) -> std::io::Result<()> {
    let mut upstream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(target))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"))??;

    if !initial.is_empty() {
        upstream.write_all(initial).await?;
    }

    let (mut client_r, mut client_w) = conn.split();
    let (mut upstream_r, mut upstream_w) = upstream.split();

    tokio::select! {
        r = copy_until_eof(&mut client_r, &mut upstream_w, buf_size) => r,
        r = copy_until_eof(&mut upstream_r, &mut client_w, buf_size) => r,
    }
}

/// One direction of a bidirectional relay: read until EOF or error, write
/// through unbuffered. Torn down the moment either direction's read returns
/// (spec.md §4.4: "per-direction copy runs until its read returns").
async fn copy_until_eof<R, W>(reader: &mut R, writer: &mut W, buf_size: usize) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; buf_size];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await?;
    }
}

#[cfg(test)]
#[path = "tcp_forward_tests.rs"]
mod tests;
