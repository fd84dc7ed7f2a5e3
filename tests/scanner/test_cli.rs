// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fabstir_route_scanner::cli::{execute, Cli};
use fabstir_route_scanner::report::ProxyConfig;
use fabstir_route_scanner::RouteRecord;

use super::common::{healthy_cluster, mount_generate, mount_tags, Cluster, HOST_A, HOST_B};

/// Flags pointing the binary at the loopback cluster
fn cli_for(cluster: &Cluster, outputs: &[(&str, &Path)]) -> Cli {
    let mut args: Vec<String> = vec![
        "route-scanner".into(),
        "--peers".into(),
        format!("{},{}", HOST_A, HOST_B),
        "--port".into(),
        cluster.port.to_string(),
        "--cidr".into(),
        "127.0.0.0/8".into(),
        "--runs".into(),
        "1".into(),
        "--cooldown".into(),
        "0".into(),
        "--timeout-load".into(),
        "30".into(),
        "--timeout-bench".into(),
        "30".into(),
    ];
    for (flag, path) in outputs {
        args.push(flag.to_string());
        args.push(path.display().to_string());
    }
    Cli::parse_from(args)
}

async fn generate_calls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/generate")
        .count()
}

#[tokio::test]
async fn test_proxy_written_before_benchmarks_finish() {
    let cluster = Cluster::start().await;
    for server in [&cluster.host_a, &cluster.host_b] {
        mount_tags(server, &["llama3"]).await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(20))
                    .set_body_json(serde_json::json!({"eval_count": 1, "eval_duration": 1})),
            )
            .mount(server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let proxy = dir.path().join("proxy.json");
    let csv = dir.path().join("routes.csv");
    let cli = cli_for(&cluster, &[("-p", &proxy), ("-o", &csv)]);

    let proxy_written = async {
        while !proxy.exists() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    };
    tokio::select! {
        result = execute(cli) => panic!("scan ended before benchmarks were cut off: {:?}", result),
        _ = tokio::time::timeout(Duration::from_secs(5), proxy_written) => {}
    }

    assert!(proxy.exists());
    assert!(!csv.exists());
    let config: ProxyConfig =
        serde_json::from_str(&std::fs::read_to_string(&proxy).unwrap()).unwrap();
    assert_eq!(config.targets.len(), 2);
}

#[tokio::test]
async fn test_proxy_only_run_writes_no_routing_table() {
    let cluster = healthy_cluster().await;
    let dir = TempDir::new().unwrap();
    let proxy = dir.path().join("proxy.json");

    execute(cli_for(&cluster, &[("-p", &proxy)])).await.unwrap();

    let written: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(written, vec![std::ffi::OsString::from("proxy.json")]);
    assert_eq!(generate_calls(&cluster.host_a).await, 0);
    assert_eq!(generate_calls(&cluster.host_b).await, 0);
}

#[tokio::test]
async fn test_empty_table_writes_no_files() {
    let cluster = Cluster::start().await;
    mount_tags(&cluster.host_a, &["llama3"]).await;
    mount_generate(&cluster.host_a, "llama3", 100, 0).await;
    mount_tags(&cluster.host_b, &[]).await;

    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("routes.csv");
    let json = dir.path().join("routes.json");

    execute(cli_for(&cluster, &[("-o", &csv), ("--json", &json)]))
        .await
        .unwrap();

    assert!(generate_calls(&cluster.host_a).await > 0);
    assert!(!csv.exists());
    assert!(!json.exists());
}

#[tokio::test]
async fn test_json_flag_alone_runs_benchmarks() {
    let cluster = healthy_cluster().await;
    let dir = TempDir::new().unwrap();
    let json = dir.path().join("routes.json");

    execute(cli_for(&cluster, &[("--json", &json)])).await.unwrap();

    assert!(generate_calls(&cluster.host_a).await > 0);
    let routes: Vec<RouteRecord> =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(routes.len(), 4);
    assert!(routes.iter().all(|r| r.tokens_per_second > 0.0));
}
