//! Duplicate diagnostic.
//!
//! Collects the evidence behind a failed case: the total row count, every
//! `row_id` seen more than once and every data row that is really a header
//! line. Duplicates and header leaks point at different root causes and are
//! reported separately.

use rowcheck_engine::{Engine, ReadOptions};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::{
    dataset::COLUMNS,
    error::{HarnessError, HarnessResult},
};

const KEY_COLUMN: &str = COLUMNS[0];

/// A `row_id` seen more than once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    /// Duplicated key
    pub row_id: String,
    /// Number of rows carrying it
    pub count: u64,
}

/// Evidence gathered for one persisted dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    /// Rows in the directory read as one dataset
    pub total_rows: u64,
    /// Duplicated keys, most frequent first
    pub duplicates: Vec<DuplicateKey>,
    /// Rows whose `row_id` is the literal header name
    pub header_leaks: Vec<Vec<String>>,
}

impl DiagnosticReport {
    /// Whether any defect evidence was found
    pub fn has_evidence(&self) -> bool {
        !self.duplicates.is_empty() || !self.header_leaks.is_empty()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total rows: {}", self.total_rows)?;

        writeln!(f, "Duplicates")?;
        let duplicates: Vec<Vec<String>> = self
            .duplicates
            .iter()
            .map(|d| vec![d.row_id.clone(), d.count.to_string()])
            .collect();
        write_table(f, &[KEY_COLUMN, "count"], &duplicates)?;

        writeln!(f, "Row header in data")?;
        write_table(f, &COLUMNS, &self.header_leaks)
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, header: &[&str], rows: &[Vec<String>]) -> fmt::Result {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(cell.len()),
                None => widths.push(cell.len()),
            }
        }
    }

    let border: String = widths.iter().map(|w| format!("+{}", "-".repeat(w + 2))).collect();

    writeln!(f, "{border}+")?;
    write_row(f, &widths, header.iter().copied())?;
    writeln!(f, "{border}+")?;
    for row in rows {
        write_row(f, &widths, row.iter().map(String::as_str))?;
    }
    if rows.is_empty() {
        writeln!(f, "(no rows)")?;
    }
    writeln!(f, "{border}+")
}

fn write_row<'r>(
    f: &mut fmt::Formatter<'_>,
    widths: &[usize],
    mut cells: impl Iterator<Item = &'r str>,
) -> fmt::Result {
    for width in widths {
        write!(f, "| {:<width$} ", cells.next().unwrap_or(""), width = *width)?;
    }
    writeln!(f, "|")
}

/// Re-reads a persisted dataset looking for duplicate-row evidence
pub struct DuplicateDiagnostic<'a> {
    engine: &'a dyn Engine,
    options: ReadOptions,
}

impl<'a> DuplicateDiagnostic<'a> {
    /// Diagnostic reading with `options`
    pub fn new(engine: &'a dyn Engine, options: ReadOptions) -> Self {
        Self { engine, options }
    }

    /// Gather evidence from `path` read as one dataset
    pub async fn diagnose(&self, path: &Path) -> HarnessResult<DiagnosticReport> {
        let frame = self.engine.read(path, self.options);

        let total_rows = frame.count().await.map_err(HarnessError::read(path))?;
        let duplicates: Vec<DuplicateKey> = frame
            .group_count(KEY_COLUMN)
            .await
            .map_err(HarnessError::read(path))?
            .into_iter()
            .filter(|group| group.count > 1)
            .map(|group| DuplicateKey { row_id: group.key, count: group.count })
            .collect();
        let header_leaks =
            frame.filter_eq(KEY_COLUMN, KEY_COLUMN).await.map_err(HarnessError::read(path))?;

        info!(
            path = %path.display(),
            total_rows,
            duplicate_keys = duplicates.len(),
            header_leaks = header_leaks.len(),
            "Diagnostic complete"
        );
        Ok(DiagnosticReport { total_rows, duplicates, header_leaks })
    }
}
