// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tailscale CLI peer source
//!
//! Runs `tailscale status --json` and turns the local node plus every peer
//! into [`PeerRecord`]s.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::process::Command;
use tracing::debug;

use super::source::PeerSource;
use super::types::{DiscoveryError, PeerRecord};

/// Peer source backed by the `tailscale` binary
pub struct TailscaleStatusSource {
    binary: String,
}

impl TailscaleStatusSource {
    /// # Arguments
    /// * `binary` - Name or path of the tailscale CLI
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TailscaleStatusSource {
    fn default() -> Self {
        Self::new("tailscale")
    }
}

#[async_trait]
impl PeerSource for TailscaleStatusSource {
    async fn list_peers(&self) -> Result<Vec<PeerRecord>, DiscoveryError> {
        let output = Command::new(&self.binary)
            .args(["status", "--json"])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DiscoveryError::SourceUnavailable(format!(
                        "'{}' command not found. Is Tailscale installed?",
                        self.binary
                    ))
                } else {
                    DiscoveryError::SourceUnavailable(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(DiscoveryError::SourceFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let records = parse_status(&output.stdout)?;
        debug!("tailscale reported {} nodes", records.len());
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "tailscale"
    }
}

/// Parse the JSON printed by `tailscale status --json`
pub fn parse_status(json: &[u8]) -> Result<Vec<PeerRecord>, DiscoveryError> {
    let status: TailscaleStatus = serde_json::from_slice(json)
        .map_err(|e| DiscoveryError::MalformedStatus(format!("JSON parse error: {}", e)))?;

    let mut records = Vec::new();
    if let Some(node) = status.self_node {
        records.push(node.into_record());
    }

    // The peer map is keyed by node key; sort for a stable order
    let mut peers: Vec<_> = status.peer.unwrap_or_default().into_iter().collect();
    peers.sort_by(|a, b| a.0.cmp(&b.0));
    records.extend(peers.into_iter().map(|(_, node)| node.into_record()));

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct TailscaleStatus {
    #[serde(rename = "Self")]
    self_node: Option<TailscaleNode>,
    #[serde(rename = "Peer")]
    peer: Option<HashMap<String, TailscaleNode>>,
}

#[derive(Debug, Deserialize)]
struct TailscaleNode {
    #[serde(rename = "HostName", default)]
    host_name: String,
    #[serde(rename = "DNSName", default)]
    dns_name: String,
    #[serde(rename = "TailscaleIPs", default)]
    tailscale_ips: Option<Vec<String>>,
    #[serde(rename = "Online", default)]
    online: bool,
}

impl TailscaleNode {
    fn into_record(self) -> PeerRecord {
        let identity = if self.host_name.is_empty() {
            self.dns_name
        } else {
            self.host_name
        };
        // Entries that are not valid IPs are skipped rather than failing the scan
        let addresses = self
            .tailscale_ips
            .unwrap_or_default()
            .iter()
            .filter_map(|ip| ip.parse::<IpAddr>().ok())
            .collect();
        PeerRecord {
            identity,
            addresses,
            online: self.online,
        }
    }
}
