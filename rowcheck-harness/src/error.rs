//! Harness error taxonomy.
//!
//! Structural failures abort the current test case only. A count mismatch is
//! not an error; it is reported as a failed case.

use rowcheck_engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Harness result type alias
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error enumeration for harness operations
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Request rejected before any data was generated
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Why the request was rejected
        reason: String,
    },

    /// Persisting a dataset failed
    #[error("Write to '{}' failed: {source}", path.display())]
    WriteFailure {
        /// Destination of the write
        path: PathBuf,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// Reading back a persisted dataset failed
    #[error("Read of '{}' failed: {source}", path.display())]
    ReadFailure {
        /// Path being read
        path: PathBuf,
        /// Engine failure
        #[source]
        source: EngineError,
    },

    /// The whole run exceeded its deadline
    #[error("Run did not finish within {seconds}s")]
    Timeout {
        /// Deadline in seconds
        seconds: u64,
    },

    /// The run report could not be written
    #[error("Report error: {0}")]
    Report(String),
}

impl HarnessError {
    /// Short taxonomy name used in run reports
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::InvalidInput { .. } => "InvalidInput",
            HarnessError::WriteFailure { .. } => "WriteFailure",
            HarnessError::ReadFailure { .. } => "ReadFailure",
            HarnessError::Timeout { .. } => "Timeout",
            HarnessError::Report(_) => "Report",
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>) -> impl FnOnce(EngineError) -> Self {
        let path = path.into();
        move |source| HarnessError::ReadFailure { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_message() {
        let err = HarnessError::read("/data/100k")(EngineError::NotFound {
            path: PathBuf::from("/data/100k"),
        });
        assert_eq!(err.kind(), "ReadFailure");
        assert!(err.to_string().contains("/data/100k"));

        let err = HarnessError::InvalidInput { reason: "row_count must be positive".into() };
        assert_eq!(err.kind(), "InvalidInput");
        assert_eq!(err.to_string(), "Invalid input: row_count must be positive");
    }
}
