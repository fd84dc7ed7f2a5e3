// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loopback cluster of mock Ollama hosts sharing one port
//!
//! Every address in 127.0.0.0/8 is local on Linux, so each host gets its own
//! IP while discovery probes a single port, the same way it does on a real
//! tailnet.

use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fabstir_route_scanner::config::ScanConfig;
use fabstir_route_scanner::discovery::{Peer, PeerDiscovery, StaticPeerSource};
use fabstir_route_scanner::{OllamaClient, Scanner};

pub const HOST_A: &str = "127.0.0.1";
pub const HOST_B: &str = "127.0.0.2";
/// Listed as a peer but nothing listens there
pub const HOST_DOWN: &str = "127.0.0.3";

pub struct Cluster {
    pub port: u16,
    pub host_a: MockServer,
    pub host_b: MockServer,
}

impl Cluster {
    pub async fn start() -> Self {
        let listener_a = TcpListener::bind((HOST_A, 0)).unwrap();
        let port = listener_a.local_addr().unwrap().port();
        let listener_b = TcpListener::bind((HOST_B, port)).unwrap();

        let host_a = MockServer::builder().listener(listener_a).start().await;
        let host_b = MockServer::builder().listener(listener_b).start().await;
        Self {
            port,
            host_a,
            host_b,
        }
    }

    pub fn config(&self) -> ScanConfig {
        let mut config = ScanConfig::default();
        config.discovery.port = self.port;
        config.discovery.cidr = "127.0.0.0/8".parse().unwrap();
        config.discovery.static_peers = vec![
            HOST_A.to_string(),
            HOST_B.to_string(),
            HOST_DOWN.to_string(),
        ];
        config.discovery.probe_timeout_ms = 200;
        config.inventory.timeout_secs = 2;
        config.benchmark.runs = 2;
        config.benchmark.cooldown = Duration::ZERO;
        config.benchmark.timeout_load = Duration::from_secs(5);
        config.benchmark.timeout_bench = Duration::from_secs(5);
        config
    }

    pub fn scanner(&self) -> Scanner {
        scanner_for(self.config())
    }
}

pub fn scanner_for(config: ScanConfig) -> Scanner {
    let source = StaticPeerSource::parse(&config.discovery.static_peers).unwrap();
    let discovery = PeerDiscovery::new(Box::new(source), config.discovery.clone());
    Scanner::new(discovery, Arc::new(OllamaClient::new()), config)
}

pub fn peer(ip: &str, port: u16) -> Peer {
    Peer::reachable(format!("{}:{}", ip, port).parse().unwrap())
}

pub async fn mount_tags(server: &MockServer, models: &[&str]) {
    let models: Vec<_> = models.iter().map(|name| json!({ "name": name })).collect();
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

/// Answer generations for `model` with `eval_count` tokens over `eval_duration_ns`
pub async fn mount_generate(server: &MockServer, model: &str, eval_count: u64, eval_duration_ns: u64) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": model })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": model,
            "response": "The internet began as ARPANET...",
            "done": true,
            "eval_count": eval_count,
            "eval_duration": eval_duration_ns,
        })))
        .mount(server)
        .await;
}

pub async fn mount_generate_error(server: &MockServer, model: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": model })))
        .respond_with(ResponseTemplate::new(status).set_body_string("model failed to load"))
        .mount(server)
        .await;
}

/// Host A runs three models at 50 tok/s, host B runs llama3 at 100 tok/s
pub async fn healthy_cluster() -> Cluster {
    let cluster = Cluster::start().await;

    mount_tags(&cluster.host_a, &["llama3", "mistral", "phi3"]).await;
    for model in ["llama3", "mistral", "phi3"] {
        mount_generate(&cluster.host_a, model, 100, 2_000_000_000).await;
    }

    mount_tags(&cluster.host_b, &["llama3"]).await;
    mount_generate(&cluster.host_b, "llama3", 100, 1_000_000_000).await;

    cluster
}
