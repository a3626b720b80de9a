//! Engine and filesystem traits.
//!
//! The harness only talks to these traits. [`crate::LocalEngine`] and
//! [`crate::LocalFileSystem`] are the shipped implementations; tests substitute
//! their own to reproduce engine faults.

use async_trait::async_trait;
use std::borrow::Cow;
use std::path::Path;

use crate::{
    cache::CacheStats,
    conf::SessionConf,
    error::EngineResult,
    format::{ReadOptions, WriteOptions},
    frame::Schema,
    types::{FileInfo, ScanSummary, WriteSummary},
};

/// Receives rows from [`Engine::scan`].
pub trait RowSink: Send {
    /// Called once with the dataset schema before the first row
    fn on_schema(&mut self, schema: &Schema) -> EngineResult<()> {
        let _ = schema;
        Ok(())
    }

    /// Called for every data row
    fn accept(&mut self, row: &[Cow<'_, str>]) -> EngineResult<()>;
}

/// A dataframe engine able to persist and re-read delimited datasets.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Session configuration of this engine
    fn conf(&self) -> &SessionConf;

    /// Write `rows` as a partitioned delimited dataset into the new directory `path`.
    ///
    /// The returned row count is counted while serializing. A completion
    /// marker is written only after all parts are committed.
    ///
    /// # Errors
    ///
    /// - [`crate::EngineError::AlreadyExists`] - `path` exists
    /// - [`crate::EngineError::Io`] - any storage failure
    /// - [`crate::EngineError::Unsupported`] - a value cannot be encoded
    async fn write_delimited(
        &self,
        path: &Path,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<WriteSummary>;

    /// Read a single file, or a directory as one dataset, into `sink`.
    ///
    /// # Errors
    ///
    /// - [`crate::EngineError::NotFound`] - `path` does not exist
    /// - [`crate::EngineError::Malformed`] - undecodable content
    /// - any error returned by the sink
    async fn scan(
        &self,
        path: &Path,
        options: &ReadOptions,
        sink: &mut dyn RowSink,
    ) -> EngineResult<ScanSummary>;

    /// Read cache statistics, for engines that cache
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }

    /// Drop all cached data
    fn clear_cache(&self) {}
}

/// Directory listing and deletion.
#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    /// Entries of a directory sorted by name; a file lists as itself
    async fn ls(&self, path: &Path) -> EngineResult<Vec<FileInfo>>;

    /// Remove a file or directory. Non-empty directories need `recursive`.
    async fn rm(&self, path: &Path, recursive: bool) -> EngineResult<()>;
}
