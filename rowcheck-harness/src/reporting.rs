//! # Run Reporting
//!
//! Per-case verdicts and the run summary. Reports serialize to JSON for
//! attaching to a defect report.

use chrono::{DateTime, Utc};
use rowcheck_engine::{CacheStats, FileInfo};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::{
    diagnostic::DiagnosticReport,
    error::{HarnessError, HarnessResult},
};

/// Status of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TestStatus {
    /// Case is executing
    Running,
    /// Authoritative and observed counts matched
    Passed,
    /// Counts differed
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Running => write!(f, "RUNNING"),
            TestStatus::Passed => write!(f, "PASSED"),
            TestStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one test case
#[derive(Debug, Clone, Serialize)]
pub struct TestCaseReport {
    /// Case name
    pub name: String,
    /// Requested base rows
    pub row_count: u64,
    /// Verdict
    pub status: TestStatus,
    /// Rows serialized by the writer
    pub authoritative_count: u64,
    /// Sum of per-file counts
    pub parts_count: u64,
    /// Whole-directory count
    pub whole_count: u64,
    /// Wall time of the case
    pub duration_ms: u64,
    /// Evidence collected on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<DiagnosticReport>,
    /// Why the diagnostic could not be collected; the verdict stands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic_error: Option<String>,
}

impl TestCaseReport {
    /// Report for a case that has just started
    pub fn running(name: impl Into<String>, row_count: u64) -> Self {
        Self {
            name: name.into(),
            row_count,
            status: TestStatus::Running,
            authoritative_count: 0,
            parts_count: 0,
            whole_count: 0,
            duration_ms: 0,
            diagnostic: None,
            diagnostic_error: None,
        }
    }

    /// Whether the case passed
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// The human verdict line
impl fmt::Display for TestCaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Test {} {}", self.name, self.status)
    }
}

/// Structural failure of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseError {
    /// Case name
    pub case: String,
    /// Error taxonomy name
    pub kind: String,
    /// Error message
    pub message: String,
}

impl CaseError {
    /// Record `error` against `case`
    pub fn new(case: impl Into<String>, error: &HarnessError) -> Self {
        Self { case: case.into(), kind: error.kind().to_string(), message: error.to_string() }
    }
}

impl fmt::Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Test {} ERROR ({}): {}", self.case, self.kind, self.message)
    }
}

/// Files of one case artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactListing {
    /// Listed directory
    pub path: PathBuf,
    /// Its entries sorted by name
    pub files: Vec<FileInfo>,
}

impl fmt::Display for ArtifactListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "** Files in {} **", self.path.display())?;
        for file in &self.files {
            writeln!(f, "{} : {}", file.name, file.size)?;
        }
        Ok(())
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Uuid,
    /// Whether the engine cache was enabled
    pub cache_enabled: bool,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time, set by [`RunReport::finish`]
    pub finished_at: Option<DateTime<Utc>>,
    /// Completed cases in execution order
    pub cases: Vec<TestCaseReport>,
    /// Cases that aborted on a structural failure
    pub errors: Vec<CaseError>,
    /// Engine cache statistics at the end of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_stats: Option<CacheStats>,
}

impl RunReport {
    /// Empty report for a run starting now
    pub fn new(run_id: Uuid, cache_enabled: bool) -> Self {
        Self {
            run_id,
            cache_enabled,
            started_at: Utc::now(),
            finished_at: None,
            cases: Vec::new(),
            errors: Vec::new(),
            cache_stats: None,
        }
    }

    /// Mark the run finished
    pub fn finish(&mut self, cache_stats: Option<CacheStats>) {
        self.cache_stats = cache_stats;
        self.finished_at = Some(Utc::now());
    }

    /// Number of failed cases
    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed()).count()
    }

    /// True when every case passed and none errored
    pub fn all_passed(&self) -> bool {
        self.errors.is_empty() && self.failed() == 0
    }

    /// Pretty JSON form
    pub fn to_json(&self) -> HarnessResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| HarnessError::Report(e.to_string()))
    }

    /// Write the JSON form to `path`
    pub fn write_json(&self, path: &Path) -> HarnessResult<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| {
            HarnessError::Report(format!("Failed to write {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "Run report written");
        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run {}: {} passed, {} failed, {} errored (cache {})",
            self.run_id,
            self.cases.len() - self.failed(),
            self.failed(),
            self.errors.len(),
            if self.cache_enabled { "enabled" } else { "disabled" }
        )
    }
}
