//! Summaries returned by engine and filesystem operations.

use serde::Serialize;
use std::path::PathBuf;

/// One committed part file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartSummary {
    /// File name inside the destination directory
    pub name: String,
    /// Data rows written (header excluded)
    pub rows: u64,
    /// Bytes written including the header
    pub bytes: u64,
}

/// Result of a committed write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Rows serialized across all parts
    pub rows_written: u64,
    /// Committed parts in name order
    pub parts: Vec<PartSummary>,
}

/// Result of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Data files read
    pub files_read: u64,
    /// Rows delivered to the sink
    pub rows_read: u64,
    /// Bytes consumed from storage or cache
    pub bytes_read: u64,
}

/// Directory entry as reported by [`crate::FileSystem::ls`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Entry name
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Whether the entry is a directory
    pub is_dir: bool,
}
