//! Engine error types.
//!
//! Every failure names the operation and the path involved so that a report
//! line is enough to locate the artifact that broke.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Engine operation result type alias
pub type EngineResult<T> = Result<T, EngineError>;

/// Error enumeration for engine and filesystem operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// I/O operation error
    #[error("I/O error during {operation} on '{}': {source}", path.display())]
    Io {
        /// Operation during which the error occurred
        operation: &'static str,
        /// Path involved in the operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Path does not exist
    #[error("Path not found: '{}'", path.display())]
    NotFound {
        /// Missing path
        path: PathBuf,
    },

    /// Write destination already exists
    #[error("Path already exists: '{}'", path.display())]
    AlreadyExists {
        /// Existing path
        path: PathBuf,
    },

    /// File content could not be decoded
    #[error("Malformed data in '{}' at line {line}: {reason}", path.display())]
    Malformed {
        /// File containing the bad data
        path: PathBuf,
        /// One-based line number
        line: u64,
        /// What was wrong
        reason: String,
    },

    /// Column is not part of the schema
    #[error("Column '{column}' not found in schema [{available}]")]
    ColumnNotFound {
        /// Requested column
        column: String,
        /// Comma separated schema columns
        available: String,
    },

    /// Value or option the engine cannot represent
    #[error("Unsupported: {reason}")]
    Unsupported {
        /// Why the request cannot be served
        reason: String,
    },
}

impl EngineError {
    /// Wrap an I/O error, mapping `NotFound` to [`EngineError::NotFound`].
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            return EngineError::NotFound { path };
        }
        EngineError::Io { operation, path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_is_mapped() {
        let err = EngineError::io(
            "open",
            "/missing/file.csv",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_io_message_names_operation_and_path() {
        let err = EngineError::io(
            "rename",
            "/data/part-00000.csv",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("rename"));
        assert!(message.contains("/data/part-00000.csv"));
    }
}
