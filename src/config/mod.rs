// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scan configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `ROUTE_SCANNER_*` environment variables, then CLI flags (applied by the
//! binary).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::discovery::Ipv4Cidr;

pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_BENCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_COOLDOWN_SECS: u64 = 5;
pub const DEFAULT_RUNS: u32 = 3;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_BENCHMARK_PROMPT: &str = "Write a paragraph about the history of the internet.";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Peer discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Inference port probed on every candidate
    pub port: u16,
    /// Overlay address range; addresses outside it are ignored
    pub cidr: Ipv4Cidr,
    /// TCP connect timeout per probe, in milliseconds
    pub probe_timeout_ms: u64,
    /// Maximum probes in flight
    pub probe_concurrency: usize,
    /// Path or name of the tailscale binary
    pub tailscale_bin: String,
    /// Explicit peer addresses; when non-empty the tailscale CLI is not used
    pub static_peers: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_OLLAMA_PORT,
            cidr: Ipv4Cidr::tailscale(),
            probe_timeout_ms: 1000,
            probe_concurrency: 50,
            tailscale_bin: "tailscale".to_string(),
            static_peers: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Inventory query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub timeout_secs: u64,
    pub concurrency: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            concurrency: 20,
        }
    }
}

impl InventoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Throughput benchmark settings
///
/// Durations are kept as [`Duration`] so callers (and tests) can use
/// sub-second cooldowns; the file and env layers speak whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Measured samples per (host, model)
    pub runs: u32,
    /// Pause between models on the same host
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,
    /// Maximum hosts benchmarked in parallel
    pub workers: usize,
    /// Timeout for the warm-up request (covers cold model loads)
    #[serde(with = "duration_secs")]
    pub timeout_load: Duration,
    /// Timeout for each measured request
    #[serde(with = "duration_secs")]
    pub timeout_bench: Duration,
    pub prompt: String,
    pub num_predict: u32,
    pub seed: u64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            workers: DEFAULT_WORKERS,
            timeout_load: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
            timeout_bench: Duration::from_secs(DEFAULT_BENCH_TIMEOUT_SECS),
            prompt: DEFAULT_BENCHMARK_PROMPT.to_string(),
            num_predict: 100,
            seed: 42,
        }
    }
}

/// Top-level configuration for one scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub discovery: DiscoveryConfig,
    pub inventory: InventoryConfig,
    pub benchmark: BenchmarkConfig,
}

impl ScanConfig {
    /// Load configuration from a TOML file, filling gaps with defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Overlay `ROUTE_SCANNER_*` environment variables
    ///
    /// Unparseable values are ignored, the same as unset ones.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_parse("ROUTE_SCANNER_RUNS") {
            self.benchmark.runs = v;
        }
        if let Some(v) = env_parse("ROUTE_SCANNER_COOLDOWN") {
            self.benchmark.cooldown = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("ROUTE_SCANNER_WORKERS") {
            self.benchmark.workers = v;
        }
        if let Some(v) = env_parse("ROUTE_SCANNER_TIMEOUT_LOAD") {
            self.benchmark.timeout_load = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("ROUTE_SCANNER_TIMEOUT_BENCH") {
            self.benchmark.timeout_bench = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("ROUTE_SCANNER_PORT") {
            self.discovery.port = v;
        }
        if let Some(v) = env_parse("ROUTE_SCANNER_CIDR") {
            self.discovery.cidr = v;
        }
        if let Ok(v) = env::var("ROUTE_SCANNER_TAILSCALE_BIN") {
            if !v.is_empty() {
                self.discovery.tailscale_bin = v;
            }
        }
    }

    /// Load defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.benchmark.runs == 0 {
            return Err(ConfigError::Invalid {
                field: "runs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.benchmark.workers == 0 {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.benchmark.timeout_load.is_zero() || self.benchmark.timeout_bench.is_zero() {
            return Err(ConfigError::Invalid {
                field: "timeout",
                reason: "load and bench timeouts must be greater than 0".to_string(),
            });
        }
        if self.benchmark.num_predict == 0 {
            return Err(ConfigError::Invalid {
                field: "num_predict",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.discovery.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.discovery.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "probe_timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.inventory.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "inventory.timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.discovery.probe_concurrency == 0 || self.inventory.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "concurrency",
                reason: "probe and inventory concurrency must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
