// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network endpoints (`{address, port}`) used by `listen_endpoint` and
//! `remote_endpoint` (spec.md §3).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// An `{address, port}` pair. `address` may be `0.0.0.0`/`127.0.0.1` per
/// spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: IpAddr, port: u16) -> Self {
        Self { address, port }
    }

    pub fn loopback(port: u16) -> Self {
        Self {
            address: IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port,
        }
    }

    pub fn to_socket_addr(self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    /// Parses `host:port`, the fallback form C4 uses when `remote_endpoint`
    /// is absent and the target comes from `args` instead (spec.md §4.4).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| EndpointParseError(s.to_string()))?;
        let port: u16 = port
            .parse()
            .map_err(|_| EndpointParseError(s.to_string()))?;
        let address: IpAddr = host
            .parse()
            .map_err(|_| EndpointParseError(s.to_string()))?;
        Ok(Endpoint { address, port })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid endpoint: {0}")]
pub struct EndpointParseError(String);

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
