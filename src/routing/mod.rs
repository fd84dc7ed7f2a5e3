// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Routing table aggregation
//!
//! Collapses raw samples into one route per (model, host) and ranks hosts
//! per model by mean throughput.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::net::SocketAddr;

use crate::benchmark::BenchmarkSample;
use crate::discovery::Peer;

/// Load-balancer route prefix for a model
pub fn route_label(model: &str) -> String {
    format!("ollama/{}", model)
}

/// Mean throughput of one model on one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub model: String,
    pub host: Peer,
    /// Mean over successful samples only
    pub tokens_per_second: f64,
    pub route_label: String,
    /// `http://ip:port` of the host
    pub endpoint: String,
    pub successful_samples: usize,
}

/// Routes grouped by model, fastest host first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
    routes: Vec<RouteRecord>,
}

impl RoutingTable {
    /// Aggregate samples into a table
    ///
    /// Pairs without a successful sample are left out entirely: they mean
    /// the host cannot serve the model, not that it serves it at 0 tok/s.
    pub fn build(samples: &[BenchmarkSample]) -> Self {
        let mut groups: BTreeMap<(&str, SocketAddr), (Peer, f64, usize)> = BTreeMap::new();
        for sample in samples.iter().filter(|s| s.success) {
            let group = groups
                .entry((sample.model.as_str(), sample.host.address))
                .or_insert((sample.host, 0.0, 0));
            group.1 += sample.tokens_per_second;
            group.2 += 1;
        }

        let mut routes: Vec<RouteRecord> = groups
            .into_iter()
            .filter_map(|((model, _), (host, total, count))| {
                let mean = total / count as f64;
                if !(mean.is_finite() && mean > 0.0) {
                    return None;
                }
                Some(RouteRecord {
                    model: model.to_string(),
                    host,
                    tokens_per_second: mean,
                    route_label: route_label(model),
                    endpoint: host.base_url(),
                    successful_samples: count,
                })
            })
            .collect();

        routes.sort_by(compare_routes);
        Self { routes }
    }

    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteRecord> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Distinct models in table order
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.routes.iter().map(|r| r.model.as_str()).collect();
        models.dedup();
        models
    }

    /// Routes for one model, fastest first
    pub fn routes_for<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a RouteRecord> + 'a {
        self.routes.iter().filter(move |r| r.model == model)
    }

    /// Fastest host for `model`
    pub fn best_route(&self, model: &str) -> Option<&RouteRecord> {
        self.routes.iter().find(|r| r.model == model)
    }
}

/// Model ascending, throughput descending, host address ascending
fn compare_routes(a: &RouteRecord, b: &RouteRecord) -> Ordering {
    a.model
        .cmp(&b.model)
        .then_with(|| b.tokens_per_second.total_cmp(&a.tokens_per_second))
        .then_with(|| a.host.address.cmp(&b.host.address))
}
