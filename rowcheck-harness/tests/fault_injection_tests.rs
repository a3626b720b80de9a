//! Engine and filesystem faults injected mid-run.
//!
//! Each double wraps the local implementation and fails one kind of call, so
//! the harness has to keep its verdicts and keep going.

use async_trait::async_trait;
use rowcheck_core::{HarnessConfig, TestCase};
use rowcheck_engine::{
    CacheStats, Engine, EngineError, EngineResult, FileInfo, FileSystem, LocalEngine,
    LocalFileSystem, ReadOptions, RowSink, ScanSummary, SessionConf, WriteOptions, WriteSummary,
};
use rowcheck_harness::{
    local_engine, ArtifactListing, CaseError, Harness, RunObserver, TestCaseReport, TestStatus,
    COLUMNS,
};
use std::borrow::Cow;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn config(temp_dir: &TempDir, tests: Vec<TestCase>) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.storage.root = temp_dir.path().to_path_buf();
    config.run.seed = Some(5);
    config.write.rows_per_file = 4;
    config.tests = tests;
    config
}

#[derive(Default)]
struct Recorder {
    verdicts: Vec<String>,
    errors: Vec<CaseError>,
}

impl RunObserver for Recorder {
    fn case_finished(&mut self, report: &TestCaseReport) {
        self.verdicts.push(report.to_string());
    }

    fn case_errored(&mut self, error: &CaseError) {
        self.errors.push(error.clone());
    }

    fn artifacts_listed(&mut self, _listing: &ArtifactListing) {}
}

fn malformed(path: &Path) -> EngineError {
    EngineError::Malformed { path: path.to_path_buf(), line: 1, reason: "truncated block".into() }
}

/// Fails whole-directory reads of any case directory named `broken`.
struct BrokenDirectoryEngine {
    inner: LocalEngine,
}

#[async_trait]
impl Engine for BrokenDirectoryEngine {
    fn conf(&self) -> &SessionConf {
        self.inner.conf()
    }

    async fn write_delimited(
        &self,
        path: &Path,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<WriteSummary> {
        self.inner.write_delimited(path, header, rows, options).await
    }

    async fn scan(
        &self,
        path: &Path,
        options: &ReadOptions,
        sink: &mut dyn RowSink,
    ) -> EngineResult<ScanSummary> {
        if path.is_dir() && path.file_name().is_some_and(|name| name == "broken") {
            return Err(malformed(path));
        }
        self.inner.scan(path, options, sink).await
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        self.inner.cache_stats()
    }
}

/// The first directory read sees one extra row; every later one fails.
struct FlakyDiagnosticEngine {
    inner: LocalEngine,
    directory_scans: AtomicU64,
}

#[async_trait]
impl Engine for FlakyDiagnosticEngine {
    fn conf(&self) -> &SessionConf {
        self.inner.conf()
    }

    async fn write_delimited(
        &self,
        path: &Path,
        header: &[String],
        rows: &mut (dyn Iterator<Item = Vec<String>> + Send),
        options: &WriteOptions,
    ) -> EngineResult<WriteSummary> {
        self.inner.write_delimited(path, header, rows, options).await
    }

    async fn scan(
        &self,
        path: &Path,
        options: &ReadOptions,
        sink: &mut dyn RowSink,
    ) -> EngineResult<ScanSummary> {
        if !path.is_dir() {
            return self.inner.scan(path, options, sink).await;
        }
        if self.directory_scans.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(malformed(path));
        }

        let mut summary = self.inner.scan(path, options, &mut *sink).await?;
        let extra: Vec<Cow<'_, str>> = COLUMNS.iter().map(|c| Cow::Borrowed(*c)).collect();
        sink.accept(&extra)?;
        summary.rows_read += 1;
        Ok(summary)
    }
}

/// Lists normally but refuses every removal.
struct ReadOnlyFileSystem {
    inner: LocalFileSystem,
}

#[async_trait]
impl FileSystem for ReadOnlyFileSystem {
    async fn ls(&self, path: &Path) -> EngineResult<Vec<FileInfo>> {
        self.inner.ls(path).await
    }

    async fn rm(&self, path: &Path, _recursive: bool) -> EngineResult<()> {
        Err(EngineError::io(
            "remove",
            path,
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only mount"),
        ))
    }
}

#[tokio::test]
async fn test_read_failure_aborts_only_its_case() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir, vec![TestCase::new("broken", 10), TestCase::new("next", 10)]);
    let engine = Arc::new(BrokenDirectoryEngine { inner: local_engine(&config, SessionConf::new()) });
    let harness = Harness::new(config, engine, Arc::new(LocalFileSystem::new()));
    let mut recorder = Recorder::default();

    let report = harness.run(&mut recorder).await;

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].case, "broken");
    assert_eq!(report.errors[0].kind, "ReadFailure");
    assert_eq!(recorder.errors, report.errors);
    assert_eq!(recorder.verdicts, vec!["Test next PASSED".to_string()]);
    assert_eq!(report.cases.len(), 1);
    assert_eq!(report.cases[0].whole_count, 19);
    assert!(!report.all_passed());
}

#[tokio::test]
async fn test_failed_diagnostic_keeps_the_fail_verdict() {
    let temp_dir = TempDir::new().unwrap();
    let config = config(&temp_dir, vec![TestCase::new("small", 10)]);
    let engine = Arc::new(FlakyDiagnosticEngine {
        inner: local_engine(&config, SessionConf::new()),
        directory_scans: AtomicU64::new(0),
    });
    let harness = Harness::new(config, engine, Arc::new(LocalFileSystem::new()));
    let mut recorder = Recorder::default();

    let report = harness.run(&mut recorder).await;

    assert_eq!(recorder.verdicts, vec!["Test small FAILED".to_string()]);
    assert!(recorder.errors.is_empty());
    assert!(report.errors.is_empty());

    let case = &report.cases[0];
    assert_eq!(case.status, TestStatus::Failed);
    assert_eq!(case.authoritative_count, 19);
    assert_eq!(case.whole_count, 20);
    assert!(case.diagnostic.is_none());
    let reason = case.diagnostic_error.as_deref().unwrap();
    assert!(reason.contains("truncated block"), "{reason}");
}

#[tokio::test]
async fn test_cleanup_failure_is_logged_not_reported() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config(&temp_dir, vec![TestCase::new("kept", 10)]);
    config.run.delete_data_after_testing = true;
    let engine = Arc::new(local_engine(&config, SessionConf::new()));
    let fs = Arc::new(ReadOnlyFileSystem { inner: LocalFileSystem::new() });
    let harness = Harness::new(config, engine, fs);
    let mut recorder = Recorder::default();

    let report = harness.run(&mut recorder).await;

    assert!(report.all_passed(), "{report:?}");
    assert_eq!(recorder.verdicts, vec!["Test kept PASSED".to_string()]);
    assert!(report.errors.is_empty());
    assert!(harness.scope().case_path("kept").exists());
}
