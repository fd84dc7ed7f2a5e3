// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Target list for an Ollama load-balancing proxy
//!
//! Built straight from the inventory, so it is available without running
//! any benchmarks.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::ReportError;
use crate::inventory::Inventory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTarget {
    pub url: String,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub targets: Vec<ProxyTarget>,
}

impl ProxyConfig {
    /// One target per host that has at least one model
    pub fn from_inventory(inventory: &Inventory) -> Self {
        let targets = inventory
            .iter()
            .filter(|entry| !entry.models.is_empty())
            .map(|entry| ProxyTarget {
                url: entry.host.base_url(),
                models: entry.models.clone(),
            })
            .collect();
        Self { targets }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!("Saved proxy config to: {}", path.display());
        Ok(())
    }
}
