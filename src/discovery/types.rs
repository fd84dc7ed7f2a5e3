// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for peer discovery

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

/// A host on the overlay network exposing the inference port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Peer {
    /// IP and inference port
    pub address: SocketAddr,
    /// Whether the port accepted a TCP connection during discovery
    pub reachable: bool,
}

impl Peer {
    pub fn reachable(address: SocketAddr) -> Self {
        Self {
            address,
            reachable: true,
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.address.ip()
    }

    /// Base URL of the inference API on this peer
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address)
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// A raw entry returned by a peer source, before filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Host name or node identity as reported by the source
    pub identity: String,
    pub addresses: Vec<IpAddr>,
    pub online: bool,
}

/// Errors that abort discovery, and with it the whole scan
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The peer source could not be invoked at all
    #[error("Peer source unavailable: {0}")]
    SourceUnavailable(String),

    /// The peer source ran but reported a failure
    #[error("Peer source failed (exit code {code:?}): {stderr}")]
    SourceFailed { code: Option<i32>, stderr: String },

    /// The peer source output could not be parsed
    #[error("Malformed peer status: {0}")]
    MalformedStatus(String),

    /// No candidate answered on the inference port
    #[error("No reachable peers on port {port} ({candidates} candidates probed)")]
    NoReachablePeers { port: u16, candidates: usize },
}
