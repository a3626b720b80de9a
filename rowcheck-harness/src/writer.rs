//! Persistence writer.

use rowcheck_engine::{Engine, WriteOptions};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{
    dataset::{Dataset, SyntheticRecord},
    error::{HarnessError, HarnessResult},
};

/// Counts the rows handed to the engine.
struct Counted<I> {
    inner: I,
    rows: u64,
}

impl<I: Iterator> Iterator for Counted<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.rows += 1;
        Some(item)
    }
}

/// Serializes datasets through an [`Engine`]
pub struct PersistenceWriter<'a> {
    engine: &'a dyn Engine,
    options: WriteOptions,
}

impl<'a> PersistenceWriter<'a> {
    /// Writer using `options` for every dataset
    pub fn new(engine: &'a dyn Engine, options: WriteOptions) -> Self {
        Self { engine, options }
    }

    /// Persist `dataset` into the new directory `destination`.
    ///
    /// Returns the authoritative row count: the number of records streamed
    /// into the engine while writing.
    pub async fn write(&self, dataset: &Dataset, destination: &Path) -> HarnessResult<u64> {
        let mut rows = Counted { inner: dataset.records().map(SyntheticRecord::into_row), rows: 0 };

        let summary = self
            .engine
            .write_delimited(destination, &SyntheticRecord::header(), &mut rows, &self.options)
            .await
            .map_err(|source| HarnessError::WriteFailure {
                path: destination.to_path_buf(),
                source,
            })?;

        for part in &summary.parts {
            debug!(part = %part.name, rows = part.rows, bytes = part.bytes, "Part written");
        }
        if summary.rows_written != rows.rows {
            warn!(
                streamed = rows.rows,
                engine_reported = summary.rows_written,
                "Engine reported a different row count than was streamed"
            );
        }

        info!(
            path = %destination.display(),
            rows = rows.rows,
            parts = summary.parts.len(),
            "Dataset persisted"
        );
        Ok(rows.rows)
    }
}
