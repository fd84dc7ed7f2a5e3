// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Peer discovery
//!
//! Lists overlay peers from a [`PeerSource`], keeps IPv4 addresses inside
//! the configured range and probes the inference port on each of them.
//! Only peers that accept a TCP connection are returned.

pub mod cidr;
pub mod source;
pub mod tailscale;
pub mod types;

pub use cidr::Ipv4Cidr;
pub use source::{PeerSource, StaticPeerSource};
pub use tailscale::TailscaleStatusSource;
pub use types::{DiscoveryError, Peer, PeerRecord};

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::config::DiscoveryConfig;

/// Finds peers that expose the inference port
pub struct PeerDiscovery {
    source: Box<dyn PeerSource>,
    config: DiscoveryConfig,
}

impl PeerDiscovery {
    pub fn new(source: Box<dyn PeerSource>, config: DiscoveryConfig) -> Self {
        Self { source, config }
    }

    /// Build discovery with the source implied by the configuration
    ///
    /// An explicit peer list wins over the tailscale CLI.
    pub fn from_config(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let source: Box<dyn PeerSource> = if config.static_peers.is_empty() {
            Box::new(TailscaleStatusSource::new(config.tailscale_bin.clone()))
        } else {
            Box::new(StaticPeerSource::parse(&config.static_peers)?)
        };
        Ok(Self::new(source, config))
    }

    /// Run discovery once
    ///
    /// # Returns
    /// Reachable peers sorted by address, or an error when the source fails
    /// or nothing answers on the inference port
    pub async fn discover(&self) -> Result<Vec<Peer>, DiscoveryError> {
        info!("Scanning {} peers for active inference hosts...", self.source.name());

        let records = self.source.list_peers().await?;
        let candidates = candidate_addresses(&records, &self.config.cidr);
        debug!(
            "{} peer records, {} candidate addresses in {}",
            records.len(),
            candidates.len(),
            self.config.cidr
        );

        let port = self.config.port;
        let timeout = self.config.probe_timeout();
        let probed: Vec<Option<Peer>> = stream::iter(candidates.iter().copied())
            .map(|ip| async move {
                let address = SocketAddr::new(IpAddr::V4(ip), port);
                if probe(address, timeout).await {
                    Some(Peer::reachable(address))
                } else {
                    debug!("{} did not answer on port {}", ip, port);
                    None
                }
            })
            .buffer_unordered(self.config.probe_concurrency.max(1))
            .collect()
            .await;

        let mut peers: Vec<Peer> = probed.into_iter().flatten().collect();
        peers.sort();

        if peers.is_empty() {
            return Err(DiscoveryError::NoReachablePeers {
                port,
                candidates: candidates.len(),
            });
        }

        info!(
            "Found {} active hosts out of {} candidates",
            peers.len(),
            candidates.len()
        );
        Ok(peers)
    }
}

/// Unique IPv4 addresses inside `cidr`, in ascending order
///
/// IPv6 addresses are ignored.
pub fn candidate_addresses(records: &[PeerRecord], cidr: &Ipv4Cidr) -> BTreeSet<Ipv4Addr> {
    records
        .iter()
        .flat_map(|r| r.addresses.iter())
        .filter_map(|addr| match addr {
            IpAddr::V4(v4) if cidr.contains(*v4) => Some(*v4),
            _ => None,
        })
        .collect()
}

/// Bounded TCP connect probe
pub async fn probe(address: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(address)).await,
        Ok(Ok(_))
    )
}
