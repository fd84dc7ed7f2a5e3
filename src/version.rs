// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the route scanner

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "tailscale-discovery",
    "static-peers",
    "ollama-inventory",
    "warmup-then-measure",
    "host-parallel-benchmarks",
    "routing-table",
    "csv-export",
    "json-export",
    "proxy-targets",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Route Scanner {} ({})", VERSION_NUMBER, BUILD_DATE)
}
