// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scan pipeline: discovery, inventory, benchmarks, routing table
//!
//! Only discovery failures and a network with no models at all end a scan
//! early. Everything below the host level degrades the report instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::benchmark::{BenchmarkRun, BenchmarkRunner};
use crate::client::{InferenceClient, OllamaClient};
use crate::config::{ConfigError, ScanConfig};
use crate::discovery::{DiscoveryError, Peer, PeerDiscovery};
use crate::inventory::{Inventory, InventoryCollector};
use crate::routing::RoutingTable;

/// Run-level failures
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Hosts found, but no models detected ({hosts} hosts answered)")]
    NoModels { hosts: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// How far the pipeline should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Discover, inventory, benchmark and build the routing table
    Full,
    /// Stop after the inventory (enough for a proxy target list)
    InventoryOnly,
}

/// Everything one scan produced
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub peers: Vec<Peer>,
    pub inventory: Inventory,
    pub run: Option<BenchmarkRun>,
    pub table: Option<RoutingTable>,
}

/// Wires the pipeline stages together
pub struct Scanner {
    discovery: PeerDiscovery,
    collector: InventoryCollector,
    runner: BenchmarkRunner,
}

impl Scanner {
    pub fn new(
        discovery: PeerDiscovery,
        client: Arc<dyn InferenceClient>,
        config: ScanConfig,
    ) -> Self {
        Self {
            discovery,
            collector: InventoryCollector::new(client.clone(), config.inventory),
            runner: BenchmarkRunner::new(client, config.benchmark),
        }
    }

    /// Validate `config` and build a scanner that talks to real hosts
    pub fn from_config(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let discovery = PeerDiscovery::from_config(config.discovery.clone())?;
        Ok(Self::new(discovery, Arc::new(OllamaClient::new()), config))
    }

    /// Discovery plus inventory
    ///
    /// Enough for a proxy target list, which callers can write before any
    /// benchmark starts.
    pub async fn inventory(&self) -> Result<(Vec<Peer>, Inventory), ScanError> {
        let peers = self.discovery.discover().await?;

        let inventory = self.collector.collect(&peers).await;
        if inventory.has_no_models() {
            return Err(ScanError::NoModels {
                hosts: inventory.len(),
            });
        }
        Ok((peers, inventory))
    }

    /// Benchmark an inventory and aggregate the routing table
    pub async fn benchmark(&self, inventory: &Inventory) -> (BenchmarkRun, RoutingTable) {
        let run = self.runner.run(inventory).await;
        let table = RoutingTable::build(&run.samples);
        if table.is_empty() {
            warn!("Benchmarks completed but no successful results found");
        }
        (run, table)
    }

    pub async fn scan(&self, mode: ScanMode) -> Result<ScanReport, ScanError> {
        let started_at = Utc::now();
        let (peers, inventory) = self.inventory().await?;

        let (run, table) = match mode {
            ScanMode::InventoryOnly => {
                info!("Skipping benchmarks (inventory-only mode)");
                (None, None)
            }
            ScanMode::Full => {
                let (run, table) = self.benchmark(&inventory).await;
                (Some(run), Some(table))
            }
        };

        Ok(ScanReport {
            started_at,
            finished_at: Utc::now(),
            peers,
            inventory,
            run,
            table,
        })
    }
}
