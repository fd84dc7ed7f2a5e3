// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use tempfile::TempDir;

use fabstir_route_scanner::report::{
    ConsoleTable, CsvReport, JsonReport, ProxyConfig, ReportSink,
};
use fabstir_route_scanner::{RouteRecord, ScanMode};

use super::common::{healthy_cluster, HOST_A, HOST_B};

#[tokio::test]
async fn test_scan_outputs_round_out_the_report() {
    let cluster = healthy_cluster().await;
    let report = cluster.scanner().scan(ScanMode::Full).await.unwrap();
    let table = report.table.as_ref().unwrap();
    let dir = TempDir::new().unwrap();

    let csv_path = dir.path().join("routes.csv");
    CsvReport::new(&csv_path).write_table(table).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], "model,route,ip,tps");
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1], format!("llama3,ollama/llama3,http://{}:{},100.00", HOST_B, cluster.port));
    assert_eq!(lines[2], format!("llama3,ollama/llama3,http://{}:{},50.00", HOST_A, cluster.port));

    let json_path = dir.path().join("routes.json");
    JsonReport::new(&json_path).write_table(table).unwrap();
    let routes: Vec<RouteRecord> =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(routes.as_slice(), table.routes());

    let proxy_path = dir.path().join("proxy.json");
    ProxyConfig::from_inventory(&report.inventory)
        .write_to(&proxy_path)
        .unwrap();
    let proxy: ProxyConfig =
        serde_json::from_str(&std::fs::read_to_string(&proxy_path).unwrap()).unwrap();
    assert_eq!(proxy.targets.len(), 2);

    let mut console = ConsoleTable::new(Vec::new());
    console.write_table(table).unwrap();
    let rendered = String::from_utf8(console.into_inner()).unwrap();
    assert!(rendered.contains("ollama/phi3"));
    assert!(rendered.contains("100.00"));
}
