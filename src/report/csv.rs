// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CSV export of the routing table

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{format_tps, ReportError, ReportSink};
use crate::routing::RoutingTable;

/// Writes `model,route,ip,tps` rows to a file
pub struct CsvReport {
    path: PathBuf,
}

impl CsvReport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Render the table as CSV text
pub fn to_csv(table: &RoutingTable) -> String {
    let mut csv = String::from("model,route,ip,tps\n");
    for route in table.iter() {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            escape(&route.model),
            escape(&route.route_label),
            escape(&route.endpoint),
            format_tps(route.tokens_per_second)
        ));
    }
    csv
}

/// Quote a field when it contains a separator, quote or newline
fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl ReportSink for CsvReport {
    fn write_table(&mut self, table: &RoutingTable) -> Result<(), ReportError> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(to_csv(table).as_bytes())?;
        out.flush()?;
        info!("Saved routing table to: {}", self.path.display());
        Ok(())
    }
}
