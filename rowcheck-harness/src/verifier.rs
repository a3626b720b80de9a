//! Consistency verifier.
//!
//! Counts a persisted dataset twice: once per data file and once as a whole
//! directory read.

use rowcheck_engine::{Engine, FileSystem, ReadOptions, SUCCESS_MARKER};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};

/// Both read-back counts of one dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verification {
    /// Sum of the row counts of every data file read on its own
    pub parts_count: u64,
    /// Row count of the directory read as one dataset
    pub whole_count: u64,
    /// Data files counted
    pub files: u64,
}

impl Verification {
    /// Whether the two strategies agree
    pub fn is_consistent(&self) -> bool {
        self.parts_count == self.whole_count
    }
}

/// Reads a persisted dataset back two ways
pub struct ConsistencyVerifier<'a> {
    engine: &'a dyn Engine,
    fs: &'a dyn FileSystem,
    options: ReadOptions,
}

impl<'a> ConsistencyVerifier<'a> {
    /// Verifier reading with `options`
    pub fn new(engine: &'a dyn Engine, fs: &'a dyn FileSystem, options: ReadOptions) -> Self {
        Self { engine, fs, options }
    }

    /// Count `destination` per file and as a whole. Read failures propagate.
    pub async fn verify(&self, destination: &Path) -> HarnessResult<Verification> {
        let entries = self.fs.ls(destination).await.map_err(HarnessError::read(destination))?;

        let mut parts_count = 0;
        let mut files = 0;
        for entry in entries {
            if entry.is_dir || entry.name == SUCCESS_MARKER {
                continue;
            }

            let rows = self
                .engine
                .read(&entry.path, self.options)
                .count()
                .await
                .map_err(HarnessError::read(&entry.path))?;
            debug!(file = %entry.name, rows, "Counted part");
            parts_count += rows;
            files += 1;
        }

        let whole_count = self
            .engine
            .read(destination, self.options)
            .count()
            .await
            .map_err(HarnessError::read(destination))?;

        let verification = Verification { parts_count, whole_count, files };
        info!(
            path = %destination.display(),
            parts_count,
            whole_count,
            files,
            "Read back dataset"
        );
        if !verification.is_consistent() {
            warn!(parts_count, whole_count, "Per-file and whole-directory counts differ");
        }
        Ok(verification)
    }
}
