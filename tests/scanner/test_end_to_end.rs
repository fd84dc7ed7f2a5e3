// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use fabstir_route_scanner::benchmark::PairState;
use fabstir_route_scanner::report::ProxyConfig;
use fabstir_route_scanner::ScanMode;

use super::common::{healthy_cluster, peer, HOST_A, HOST_B, HOST_DOWN};

#[tokio::test]
async fn test_full_scan_ranks_hosts_per_model() {
    let cluster = healthy_cluster().await;
    let report = cluster.scanner().scan(ScanMode::Full).await.unwrap();

    let host_a = peer(HOST_A, cluster.port);
    let host_b = peer(HOST_B, cluster.port);

    assert_eq!(report.peers, vec![host_a, host_b]);
    assert_eq!(report.inventory.len(), 2);
    assert_eq!(report.inventory.pair_count(), 4);

    let run = report.run.as_ref().unwrap();
    assert_eq!(run.samples.len(), 8);
    assert!(run.samples.iter().all(|s| s.success));
    assert_eq!(run.outcomes.len(), 4);
    assert!(run
        .outcomes
        .iter()
        .all(|o| o.state == PairState::Done { successful: 2, of: 2 }));

    let table = report.table.as_ref().unwrap();
    assert_eq!(table.len(), 4);
    assert_eq!(table.models(), vec!["llama3", "mistral", "phi3"]);

    let llama: Vec<_> = table.routes_for("llama3").collect();
    assert_eq!(llama.len(), 2);
    assert_eq!(llama[0].host, host_b);
    assert!((llama[0].tokens_per_second - 100.0).abs() < 1e-9);
    assert_eq!(llama[1].host, host_a);
    assert!((llama[1].tokens_per_second - 50.0).abs() < 1e-9);
    assert_eq!(llama[0].route_label, "ollama/llama3");
}

#[tokio::test]
async fn test_every_route_is_backed_by_the_inventory() {
    let cluster = healthy_cluster().await;
    let report = cluster.scanner().scan(ScanMode::Full).await.unwrap();
    let table = report.table.unwrap();
    let down = peer(HOST_DOWN, cluster.port);

    for route in table.iter() {
        assert!(route.tokens_per_second > 0.0);
        assert_ne!(route.host, down);
        assert!(report.peers.contains(&route.host));
        assert!(report.inventory.contains(&route.host, &route.model));
    }
}

#[tokio::test]
async fn test_inventory_only_scan_skips_benchmarks() {
    let cluster = healthy_cluster().await;
    let report = cluster
        .scanner()
        .scan(ScanMode::InventoryOnly)
        .await
        .unwrap();

    assert!(report.run.is_none());
    assert!(report.table.is_none());
    assert_eq!(report.inventory.len(), 2);

    let generate_calls = cluster
        .host_a
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/generate")
        .count();
    assert_eq!(generate_calls, 0);

    let proxy = ProxyConfig::from_inventory(&report.inventory);
    assert_eq!(proxy.targets.len(), 2);
    assert_eq!(
        proxy.targets[0].url,
        format!("http://{}:{}", HOST_A, cluster.port)
    );
    assert_eq!(proxy.targets[0].models, vec!["llama3", "mistral", "phi3"]);
    assert_eq!(proxy.targets[1].models, vec!["llama3"]);
}
