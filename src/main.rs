// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use fabstir_route_scanner::cli::{execute, run_until_interrupted, Cli};
use std::env;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    // .env first, so clap env fallbacks can see it
    let cli = Cli::parse_with_dotenv();

    match run_until_interrupted(execute(cli), signal::ctrl_c()).await {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => {
            eprintln!("[!] Error: {}", e);
            std::process::exit(1);
        }
        None => {
            eprintln!("\n[!] Aborted by user.");
            Ok(())
        }
    }
}
