// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use fabstir_route_scanner::benchmark::{FailureReason, PairState};
use fabstir_route_scanner::discovery::DiscoveryError;
use fabstir_route_scanner::{ScanError, ScanMode};

use super::common::{
    mount_generate, mount_generate_error, mount_tags, peer, scanner_for, Cluster, HOST_A, HOST_B,
};

#[tokio::test]
async fn test_failed_warmup_drops_only_that_pair() {
    let cluster = Cluster::start().await;
    mount_tags(&cluster.host_a, &["llama3", "mistral"]).await;
    mount_generate(&cluster.host_a, "llama3", 80, 1_000_000_000).await;
    mount_generate_error(&cluster.host_a, "mistral", 500).await;
    mount_tags(&cluster.host_b, &["mistral"]).await;
    mount_generate(&cluster.host_b, "mistral", 40, 1_000_000_000).await;

    let report = cluster.scanner().scan(ScanMode::Full).await.unwrap();
    let run = report.run.unwrap();
    let host_a = peer(HOST_A, cluster.port);

    let failed: Vec<_> = run.warmup_failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].host, host_a);
    assert_eq!(failed[0].model, "mistral");
    match &failed[0].state {
        PairState::Failed { warmup } => {
            assert_eq!(warmup.reason, FailureReason::HttpStatus { status: 500 })
        }
        other => panic!("unexpected state {:?}", other),
    }
    assert_eq!(run.samples_for(&host_a, "mistral").count(), 0);

    let table = report.table.unwrap();
    assert_eq!(table.len(), 2);
    let mistral: Vec<_> = table.routes_for("mistral").collect();
    assert_eq!(mistral.len(), 1);
    assert_eq!(mistral[0].host, peer(HOST_B, cluster.port));
}

#[tokio::test]
async fn test_host_with_broken_inventory_is_dropped() {
    let cluster = Cluster::start().await;
    mount_tags(&cluster.host_a, &["llama3"]).await;
    mount_generate(&cluster.host_a, "llama3", 100, 1_000_000_000).await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&cluster.host_b)
        .await;

    let report = cluster.scanner().scan(ScanMode::Full).await.unwrap();

    assert_eq!(report.peers.len(), 2);
    assert_eq!(report.inventory.len(), 1);
    let table = report.table.unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.routes()[0].host, peer(HOST_A, cluster.port));
}

#[tokio::test]
async fn test_missing_timing_yields_no_route() {
    let cluster = Cluster::start().await;
    mount_tags(&cluster.host_a, &["llama3"]).await;
    mount_generate(&cluster.host_a, "llama3", 100, 0).await;
    mount_tags(&cluster.host_b, &[]).await;

    let report = cluster.scanner().scan(ScanMode::Full).await.unwrap();
    let run = report.run.unwrap();

    assert_eq!(run.samples.len(), 2);
    assert!(run
        .samples
        .iter()
        .all(|s| !s.success && s.failure_reason == Some(FailureReason::InvalidResponse)));
    assert!(report.table.unwrap().is_empty());
}

#[tokio::test]
async fn test_network_without_models_is_fatal() {
    let cluster = Cluster::start().await;
    mount_tags(&cluster.host_a, &[]).await;
    mount_tags(&cluster.host_b, &[]).await;

    let result = cluster.scanner().scan(ScanMode::Full).await;
    assert!(matches!(result, Err(ScanError::NoModels { hosts: 2 })));
}

#[tokio::test]
async fn test_peers_outside_range_are_never_probed() {
    let cluster = Cluster::start().await;
    let mut config = cluster.config();
    config.discovery.cidr = "100.0.0.0/8".parse().unwrap();

    let result = scanner_for(config).scan(ScanMode::Full).await;
    match result {
        Err(ScanError::Discovery(DiscoveryError::NoReachablePeers { candidates, .. })) => {
            assert_eq!(candidates, 0)
        }
        other => panic!("unexpected result {:?}", other.map(|r| r.peers)),
    }
    assert!(cluster.host_a.received_requests().await.unwrap().is_empty());
}
