// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod benchmark;
pub mod cli;
pub mod client;
pub mod config;
pub mod discovery;
pub mod inventory;
pub mod report;
pub mod routing;
pub mod scanner;
pub mod version;

// Re-export main types
pub use benchmark::{BenchmarkRun, BenchmarkRunner, BenchmarkSample, FailureReason, PairState};
pub use client::{InferenceClient, InferenceError, OllamaClient};
pub use config::{BenchmarkConfig, ConfigError, ScanConfig};
pub use discovery::{DiscoveryError, Peer, PeerDiscovery, PeerSource};
pub use inventory::{Inventory, InventoryCollector, InventoryEntry};
pub use report::{ConsoleTable, CsvReport, JsonReport, ProxyConfig, ReportError, ReportSink};
pub use routing::{RouteRecord, RoutingTable};
pub use scanner::{ScanError, ScanMode, ScanReport, Scanner};
