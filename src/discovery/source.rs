// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Peer source trait definition

use async_trait::async_trait;
use std::net::IpAddr;

use super::types::{DiscoveryError, PeerRecord};

/// Trait for anything that can list overlay-network peers
///
/// Discovery calls `list_peers` exactly once per scan. An error here is
/// fatal for the scan.
#[async_trait]
pub trait PeerSource: Send + Sync {
    async fn list_peers(&self) -> Result<Vec<PeerRecord>, DiscoveryError>;

    /// Get the source name for logging
    fn name(&self) -> &'static str;
}

/// A fixed list of peer addresses, e.g. from `--peers`
pub struct StaticPeerSource {
    addresses: Vec<IpAddr>,
}

impl StaticPeerSource {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self { addresses }
    }

    /// Parse a list of textual IP addresses
    pub fn parse<S: AsRef<str>>(addresses: &[S]) -> Result<Self, DiscoveryError> {
        let parsed = addresses
            .iter()
            .map(|a| {
                a.as_ref().trim().parse::<IpAddr>().map_err(|_| {
                    DiscoveryError::MalformedStatus(format!(
                        "invalid peer address '{}'",
                        a.as_ref()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parsed))
    }
}

#[async_trait]
impl PeerSource for StaticPeerSource {
    async fn list_peers(&self) -> Result<Vec<PeerRecord>, DiscoveryError> {
        Ok(self
            .addresses
            .iter()
            .map(|addr| PeerRecord {
                identity: addr.to_string(),
                addresses: vec![*addr],
                online: true,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
