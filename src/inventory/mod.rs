// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model inventory collection
//!
//! Asks every reachable host which models it has. Hosts whose query fails
//! are dropped from the inventory; the rest of the scan carries on.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{InferenceClient, InferenceError};
use crate::config::InventoryConfig;
use crate::discovery::Peer;

/// Models loaded on one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub host: Peer,
    /// Server-reported order, without duplicates
    pub models: Vec<String>,
}

impl InventoryEntry {
    pub fn new(host: Peer, models: Vec<String>) -> Self {
        Self {
            host,
            models: dedupe_models(models),
        }
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }
}

/// Hosts and their models, ordered by host address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    entries: Vec<InventoryEntry>,
}

impl Inventory {
    pub fn new(mut entries: Vec<InventoryEntry>) -> Self {
        entries.sort_by(|a, b| a.host.cmp(&b.host));
        entries.dedup_by(|a, b| a.host == b.host);
        Self { entries }
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.iter()
    }

    /// Number of hosts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total (host, model) pairs
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(|e| e.models.len()).sum()
    }

    /// True when no host reported any model
    pub fn has_no_models(&self) -> bool {
        self.pair_count() == 0
    }

    pub fn models_on(&self, host: &Peer) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.host.address == host.address)
            .map(|e| e.models.as_slice())
    }

    /// Whether `host` listed `model`
    pub fn contains(&self, host: &Peer, model: &str) -> bool {
        self.models_on(host)
            .map(|models| models.iter().any(|m| m == model))
            .unwrap_or(false)
    }
}

/// Why a host was dropped from the inventory
#[derive(Debug, Error)]
#[error("Inventory query to {host} failed: {source}")]
pub struct InventoryQueryError {
    pub host: Peer,
    #[source]
    pub source: InferenceError,
}

/// Keeps the first occurrence of every model id
///
/// Ids are compared exactly; `Llama3:8b` and `llama3:8b` stay distinct.
pub fn dedupe_models(models: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    models
        .into_iter()
        .filter(|m| seen.insert(m.clone()))
        .collect()
}

/// Queries hosts for their model lists
pub struct InventoryCollector {
    client: Arc<dyn InferenceClient>,
    config: InventoryConfig,
}

impl InventoryCollector {
    pub fn new(client: Arc<dyn InferenceClient>, config: InventoryConfig) -> Self {
        Self { client, config }
    }

    /// Query one host
    pub async fn query(&self, peer: Peer) -> Result<InventoryEntry, InventoryQueryError> {
        let timeout = self.config.timeout();
        let result = match tokio::time::timeout(timeout, self.client.list_models(&peer, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        result
            .map(|models| InventoryEntry::new(peer, models))
            .map_err(|source| InventoryQueryError { host: peer, source })
    }

    /// Query every peer concurrently
    ///
    /// Failed hosts are logged and left out.
    pub async fn collect(&self, peers: &[Peer]) -> Inventory {
        info!("Inventorying {} hosts...", peers.len());

        let results: Vec<Result<InventoryEntry, InventoryQueryError>> =
            stream::iter(peers.iter().copied())
                .map(|peer| self.query(peer))
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut entries = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(entry) => {
                    if entry.models.is_empty() {
                        info!("{} reports no models", entry.host);
                    }
                    entries.push(entry);
                }
                Err(e) => warn!("Dropping host: {}", e),
            }
        }

        let inventory = Inventory::new(entries);
        info!(
            "Inventory complete: {} hosts, {} models",
            inventory.len(),
            inventory.pair_count()
        );
        inventory
    }
}
