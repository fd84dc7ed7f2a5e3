// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON export of the routing table

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{ReportError, ReportSink};
use crate::routing::RoutingTable;

/// Writes the route records as a pretty-printed JSON array
pub struct JsonReport {
    path: PathBuf,
}

impl JsonReport {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ReportSink for JsonReport {
    fn write_table(&mut self, table: &RoutingTable) -> Result<(), ReportError> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut out, table.routes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        info!("Saved routing table JSON to: {}", self.path.display());
        Ok(())
    }
}
