// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Report output
//!
//! Renders a [`RoutingTable`] as a console table, CSV or JSON, and the
//! inventory as a proxy target list.

pub mod console;
pub mod csv;
pub mod json;
pub mod proxy;

pub use console::ConsoleTable;
pub use csv::CsvReport;
pub use json::JsonReport;
pub use proxy::{ProxyConfig, ProxyTarget};

use thiserror::Error;

use crate::routing::RoutingTable;

/// Errors from writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Destination for a finished routing table
pub trait ReportSink {
    fn write_table(&mut self, table: &RoutingTable) -> Result<(), ReportError>;
}

/// Throughput as shown in reports
pub(crate) fn format_tps(tps: f64) -> String {
    format!("{:.2}", tps)
}
