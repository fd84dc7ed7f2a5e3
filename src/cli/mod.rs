// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::config::ScanConfig;
use crate::discovery::Ipv4Cidr;
use crate::report::{ConsoleTable, CsvReport, JsonReport, ProxyConfig, ReportSink};
use crate::scanner::{ScanMode, Scanner};

/// Ollama Tailscale cluster discovery & benchmark tool
#[derive(Parser, Debug, Default)]
#[command(name = "route-scanner")]
#[command(version)]
#[command(
    about = "Discovers Ollama hosts on a Tailscale network and ranks them per model by throughput",
    long_about = None
)]
pub struct Cli {
    /// Path to save the routing table (CSV)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to save a JSON target list for an Ollama proxy server
    #[arg(short, long)]
    pub proxy: Option<PathBuf>,

    /// Path to save the routing table as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// TOML config file
    #[arg(long, env = "ROUTE_SCANNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of benchmark runs per model [default: 3]
    #[arg(long)]
    pub runs: Option<u32>,

    /// Seconds to wait between models on a host [default: 5]
    #[arg(long)]
    pub cooldown: Option<u64>,

    /// Seconds to wait for a model to load [default: 300]
    #[arg(long)]
    pub timeout_load: Option<u64>,

    /// Seconds to wait for each benchmark generation [default: 60]
    #[arg(long)]
    pub timeout_bench: Option<u64>,

    /// Max concurrent hosts to benchmark [default: 10]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Inference port probed on each peer [default: 11434]
    #[arg(long)]
    pub port: Option<u16>,

    /// Overlay address range [default: 100.0.0.0/8]
    #[arg(long)]
    pub cidr: Option<Ipv4Cidr>,

    /// Comma-separated peer IPs; skips the tailscale CLI
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Path to the tailscale binary
    #[arg(long)]
    pub tailscale_bin: Option<String>,
}

impl Cli {
    /// Load `.env` from the working directory, then parse process arguments
    ///
    /// `.env` has to be loaded first so `env` fallbacks on flags see it.
    pub fn parse_with_dotenv() -> Self {
        dotenv::dotenv().ok();
        Self::parse()
    }

    /// Same as [`Cli::parse_with_dotenv`] with an explicit env file and arguments
    pub fn parse_with_env_file<I, T>(env_file: &Path, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        dotenv::from_path(env_file).ok();
        Self::parse_from(args)
    }

    /// Benchmarks run unless only a proxy target list was requested
    pub fn should_benchmark(&self) -> bool {
        self.output.is_some() || self.json.is_some() || self.proxy.is_none()
    }

    pub fn scan_mode(&self) -> ScanMode {
        if self.should_benchmark() {
            ScanMode::Full
        } else {
            ScanMode::InventoryOnly
        }
    }

    /// Defaults, then the config file, then env, then flags
    pub fn load_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_file(path)?,
            None => ScanConfig::default(),
        };
        config.apply_env();
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut ScanConfig) {
        if let Some(runs) = self.runs {
            config.benchmark.runs = runs;
        }
        if let Some(cooldown) = self.cooldown {
            config.benchmark.cooldown = Duration::from_secs(cooldown);
        }
        if let Some(timeout) = self.timeout_load {
            config.benchmark.timeout_load = Duration::from_secs(timeout);
        }
        if let Some(timeout) = self.timeout_bench {
            config.benchmark.timeout_bench = Duration::from_secs(timeout);
        }
        if let Some(workers) = self.workers {
            config.benchmark.workers = workers;
        }
        if let Some(port) = self.port {
            config.discovery.port = port;
        }
        if let Some(cidr) = self.cidr {
            config.discovery.cidr = cidr;
        }
        if !self.peers.is_empty() {
            config.discovery.static_peers = self.peers.clone();
        }
        if let Some(bin) = &self.tailscale_bin {
            config.discovery.tailscale_bin = bin.clone();
        }
    }
}

/// Execute one scan and write the requested outputs
///
/// The proxy target list is written as soon as the inventory is known,
/// before any benchmark runs.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    info!("{}", crate::version::get_version_string());

    let scanner = Scanner::from_config(config)?;
    let (_peers, inventory) = scanner.inventory().await?;

    if let Some(path) = &cli.proxy {
        ProxyConfig::from_inventory(&inventory).write_to(path)?;
        println!("[+] Saved proxy config to: {}", path.display());
    }

    if cli.scan_mode() == ScanMode::InventoryOnly {
        println!("[-] Skipping benchmarks (Proxy-only mode).");
        return Ok(());
    }

    let (_run, table) = scanner.benchmark(&inventory).await;

    println!("\n--- Routing Table ---");
    if table.is_empty() {
        println!("[!] Benchmarks completed but no successful results found.");
        return Ok(());
    }
    ConsoleTable::stdout().write_table(&table)?;

    if let Some(path) = &cli.output {
        CsvReport::new(path).write_table(&table)?;
        println!("\n[+] Saved routing table to: {}", path.display());
    }
    if let Some(path) = &cli.json {
        JsonReport::new(path).write_table(&table)?;
        println!("[+] Saved routing table JSON to: {}", path.display());
    }

    Ok(())
}

/// Drive `work` until it finishes or `interrupt` fires
///
/// Returns `None` when interrupted. An interrupt source that fails to
/// register is ignored and `work` runs to completion.
pub async fn run_until_interrupted<W, I>(work: W, interrupt: I) -> Option<Result<()>>
where
    W: Future<Output = Result<()>>,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = work => Some(result),
        Ok(()) = interrupt => None,
    }
}
