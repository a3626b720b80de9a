//! Lazy dataframe handle and the row sinks behind its operations.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{
    error::{EngineError, EngineResult},
    format::ReadOptions,
    traits::{Engine, RowSink},
};

/// Ordered column names of a dataset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Schema with the given column names
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// `_c0.._cN` names for header-less data
    pub fn positional(width: usize) -> Self {
        Self { columns: (0..width).map(|i| format!("_c{i}")).collect() }
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column
    pub fn index_of(&self, column: &str) -> EngineResult<usize> {
        self.columns.iter().position(|c| c == column).ok_or_else(|| {
            EngineError::ColumnNotFound {
                column: column.to_string(),
                available: self.columns.join(", "),
            }
        })
    }
}

/// Number of rows sharing one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// Grouping key
    pub key: String,
    /// Rows with that key
    pub count: u64,
}

/// Counts rows.
#[derive(Debug, Default)]
pub struct CountSink {
    rows: u64,
}

impl CountSink {
    /// Rows seen so far
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl RowSink for CountSink {
    fn accept(&mut self, _row: &[Cow<'_, str>]) -> EngineResult<()> {
        self.rows += 1;
        Ok(())
    }
}

/// Counts rows per value of one column. Missing fields group under `""`.
#[derive(Debug)]
pub struct GroupCountSink {
    column: String,
    index: Option<usize>,
    groups: HashMap<String, u64>,
}

impl GroupCountSink {
    /// Group by `column`
    pub fn new(column: &str) -> Self {
        Self { column: column.to_string(), index: None, groups: HashMap::new() }
    }

    /// Groups sorted by count descending, then key ascending
    pub fn into_sorted(self) -> Vec<GroupCount> {
        let mut groups: Vec<GroupCount> =
            self.groups.into_iter().map(|(key, count)| GroupCount { key, count }).collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        groups
    }
}

impl RowSink for GroupCountSink {
    fn on_schema(&mut self, schema: &Schema) -> EngineResult<()> {
        self.index = Some(schema.index_of(&self.column)?);
        Ok(())
    }

    fn accept(&mut self, row: &[Cow<'_, str>]) -> EngineResult<()> {
        let key = self.index.and_then(|i| row.get(i)).map_or("", |v| v.as_ref());
        match self.groups.get_mut(key) {
            Some(count) => *count += 1,
            None => {
                self.groups.insert(key.to_string(), 1);
            },
        }
        Ok(())
    }
}

/// Collects rows whose `column` equals `value`.
#[derive(Debug)]
pub struct FilterEqSink {
    column: String,
    value: String,
    index: Option<usize>,
    rows: Vec<Vec<String>>,
}

impl FilterEqSink {
    /// Keep rows where `column == value`
    pub fn new(column: &str, value: &str) -> Self {
        Self { column: column.to_string(), value: value.to_string(), index: None, rows: Vec::new() }
    }

    /// Matching rows in scan order
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }
}

impl RowSink for FilterEqSink {
    fn on_schema(&mut self, schema: &Schema) -> EngineResult<()> {
        self.index = Some(schema.index_of(&self.column)?);
        Ok(())
    }

    fn accept(&mut self, row: &[Cow<'_, str>]) -> EngineResult<()> {
        let matches = self
            .index
            .and_then(|i| row.get(i))
            .is_some_and(|field| field.as_ref() == self.value);
        if matches {
            self.rows.push(row.iter().map(|f| f.to_string()).collect());
        }
        Ok(())
    }
}

/// A dataset read lazily from a file or directory. Every operation rescans.
pub struct Frame<'a> {
    engine: &'a dyn Engine,
    path: PathBuf,
    options: ReadOptions,
}

impl<'a> Frame<'a> {
    /// Frame over `path` read with `options`
    pub fn new(engine: &'a dyn Engine, path: impl Into<PathBuf>, options: ReadOptions) -> Self {
        Self { engine, path: path.into(), options }
    }

    /// Number of data rows
    pub async fn count(&self) -> EngineResult<u64> {
        let mut sink = CountSink::default();
        self.engine.scan(&self.path, &self.options, &mut sink).await?;
        Ok(sink.rows())
    }

    /// Rows per value of `column`, sorted by count descending
    pub async fn group_count(&self, column: &str) -> EngineResult<Vec<GroupCount>> {
        let mut sink = GroupCountSink::new(column);
        self.engine.scan(&self.path, &self.options, &mut sink).await?;
        Ok(sink.into_sorted())
    }

    /// Rows where `column` equals `value`
    pub async fn filter_eq(&self, column: &str, value: &str) -> EngineResult<Vec<Vec<String>>> {
        let mut sink = FilterEqSink::new(column, value);
        self.engine.scan(&self.path, &self.options, &mut sink).await?;
        Ok(sink.into_rows())
    }
}

impl dyn Engine {
    /// Lazy frame over a file or directory
    pub fn read(&self, path: impl Into<PathBuf>, options: ReadOptions) -> Frame<'_> {
        Frame::new(self, path, options)
    }
}
