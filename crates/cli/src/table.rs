// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal table renderer for `tunnel list`.

/// A left-aligned, auto-width table with a header row.
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

const SEP: &str = "  ";

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let max_data = self.rows.iter().map(|r| r.get(i).map_or(0, String::len)).max().unwrap_or(0);
                h.len().max(max_data)
            })
            .collect();

        let mut out = String::new();
        let last = self.headers.len().saturating_sub(1);

        let header_line: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| if i == last { h.to_string() } else { format!("{:<width$}", h, width = widths[i]) })
            .collect();
        out.push_str(&header_line.join(SEP));
        out.push('\n');

        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| if i == last { cell.clone() } else { format!("{:<width$}", cell, width = widths[i]) })
                .collect();
            out.push_str(&line.join(SEP));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
