//! Turning a page into a table
//!
//! A page is expected to hold a single table. The primary reader works on
//! positioned text runs: runs sharing a baseline form a row, the first row is
//! the header, and each header run's x position starts a column.
//!
//! [`parse_page_text`] reads the page's plain text instead, splitting cells
//! on a tab or a run of two or more spaces. It is used when a page's content
//! stream yields nothing better.

use super::content::TextRun;
use crate::frame::from_text_rows;
use eyre::Result;
use polars::prelude::DataFrame;
use regex::Regex;
use std::sync::LazyLock;

/// Runs whose baselines differ by at most this much share a row
pub const ROW_TOLERANCE: f64 = 2.0;

/// Slack allowed when a cell starts slightly left of its header
pub const COLUMN_TOLERANCE: f64 = 3.0;

static CELL_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{2,}").expect("cell separator pattern is valid"));

/// Split one line of page text into trimmed cells.
pub fn split_cells(line: &str) -> Vec<String> {
    CELL_SEPARATOR
        .split(line.trim())
        .map(|cell| cell.trim().to_string())
        .filter(|cell| !cell.is_empty())
        .collect()
}

/// Group runs into rows, top of the page first, each row ordered left to right.
fn group_rows(runs: &[TextRun]) -> Vec<Vec<&TextRun>> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    for run in sorted {
        match rows.last_mut() {
            Some(row) if (row[0].y - run.y).abs() <= ROW_TOLERANCE => row.push(run),
            _ => rows.push(vec![run]),
        }
    }
    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}

fn column_for(starts: &[f64], x: f64) -> usize {
    starts
        .iter()
        .rposition(|start| *start <= x + COLUMN_TOLERANCE)
        .unwrap_or(0)
}

/// Build a table from positioned text runs.
///
/// Returns `None` when the page has no text. Runs left of the first header
/// fall into the first column; several runs in one cell are joined with a
/// space; cells with no run are missing.
pub fn table_from_runs(runs: &[TextRun]) -> Result<Option<DataFrame>> {
    let mut rows = group_rows(runs).into_iter();
    let Some(header) = rows.next() else {
        return Ok(None);
    };

    let names: Vec<String> = header.iter().map(|r| r.text.trim().to_string()).collect();
    let starts: Vec<f64> = header.iter().map(|r| r.x).collect();

    let cells = rows
        .map(|row| {
            let mut cells: Vec<Option<String>> = vec![None; names.len()];
            for run in row {
                let text = run.text.trim();
                let cell = &mut cells[column_for(&starts, run.x)];
                match cell {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(text);
                    }
                    None => *cell = Some(text.to_string()),
                }
            }
            cells
        })
        .collect();

    from_text_rows(&names, cells).map(Some)
}

/// Parse a page's text into a table of text cells.
///
/// Returns `None` for pages with no header line. Rows shorter than the header
/// are padded with missing values; surplus cells are joined into the last
/// column.
pub fn parse_page_text(text: &str) -> Result<Option<DataFrame>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Ok(None);
    };
    let header = split_cells(header_line);
    if header.is_empty() {
        return Ok(None);
    }

    let rows = lines
        .enumerate()
        .map(|(i, line)| {
            let mut cells = split_cells(line);
            if cells.len() > header.len() {
                log::warn!(
                    "Row {} has {} cells for {} columns, joining the surplus",
                    i,
                    cells.len(),
                    header.len()
                );
                let surplus = cells.split_off(header.len() - 1).join(" ");
                cells.push(surplus);
            }
            let mut row: Vec<Option<String>> = cells.into_iter().map(Some).collect();
            row.resize(header.len(), None);
            row
        })
        .collect();

    from_text_rows(&header, rows).map(Some)
}
