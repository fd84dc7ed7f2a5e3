// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plain-text table for terminal output

use std::io::{self, Write};

use super::{format_tps, ReportError, ReportSink};
use crate::routing::RoutingTable;

const HEADERS: [&str; 4] = ["model", "route", "ip", "tps"];

/// Fixed-width table writer
pub struct ConsoleTable<W: Write> {
    out: W,
}

impl ConsoleTable<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleTable<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleTable<W> {
    fn write_table(&mut self, table: &RoutingTable) -> Result<(), ReportError> {
        let rows: Vec<[String; 4]> = table
            .iter()
            .map(|r| {
                [
                    r.model.clone(),
                    r.route_label.clone(),
                    r.endpoint.clone(),
                    format_tps(r.tokens_per_second),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
        write_row(&mut self.out, &header, &widths)?;
        for row in &rows {
            write_row(&mut self.out, row, &widths)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Text columns left-aligned, the numeric column right-aligned
fn write_row<W: Write>(out: &mut W, cells: &[String], widths: &[usize; 4]) -> io::Result<()> {
    let line = format!(
        "{:<w0$}  {:<w1$}  {:<w2$}  {:>w3$}",
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    );
    writeln!(out, "{}", line.trim_end())
}
