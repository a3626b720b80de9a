//! Pass/fail driver.
//!
//! Runs generate, write, verify and (on failure) diagnose for every
//! configured case in sequence. Structural failures end the current case
//! only; a count mismatch is a failed case, never an error.

use rowcheck_core::{HarnessConfig, TestCase};
use rowcheck_engine::{
    EngineError, Engine, FileSystem, LocalEngine, LocalEngineOptions, ReadOptions, SessionConf,
    WriteOptions, IO_CACHE_ENABLED,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::{
    diagnostic::DuplicateDiagnostic,
    error::{HarnessError, HarnessResult},
    generator::DatasetGenerator,
    reporting::{ArtifactListing, CaseError, RunReport, TestCaseReport, TestStatus},
    scope::RunScope,
    verifier::ConsistencyVerifier,
    writer::PersistenceWriter,
};

/// Default deadline of the cache-disabled variant
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(2000);

/// Receives progress while a run executes
pub trait RunObserver: Send {
    /// A case produced a verdict
    fn case_finished(&mut self, report: &TestCaseReport) {
        let _ = report;
    }

    /// A case aborted on a structural failure
    fn case_errored(&mut self, error: &CaseError) {
        let _ = error;
    }

    /// Artifacts of a case were listed
    fn artifacts_listed(&mut self, listing: &ArtifactListing) {
        let _ = listing;
    }
}

/// Ignores all progress
impl RunObserver for () {}

/// Engine configured from `config` with `conf` as its session
pub fn local_engine(config: &HarnessConfig, conf: SessionConf) -> LocalEngine {
    LocalEngine::new(
        conf,
        LocalEngineOptions {
            block_size: config.engine.block_size,
            cache_capacity_bytes: config.engine.cache_capacity_bytes,
        },
    )
}

/// `config` adjusted for the cache-disabled variant: caching off, data deleted
pub fn cache_disabled_config(mut config: HarnessConfig) -> HarnessConfig {
    config.run.cache_enabled = false;
    config.run.delete_data_after_testing = true;
    config
}

/// Session for the cache-disabled variant, with the flag set before any work
pub fn cache_disabled_session() -> SessionConf {
    SessionConf::new().with(IO_CACHE_ENABLED, false)
}

/// Drives a whole run against one engine
pub struct Harness {
    config: HarnessConfig,
    engine: Arc<dyn Engine>,
    fs: Arc<dyn FileSystem>,
    scope: RunScope,
    generator: DatasetGenerator,
}

impl Harness {
    /// Harness with a fresh run scope
    pub fn new(config: HarnessConfig, engine: Arc<dyn Engine>, fs: Arc<dyn FileSystem>) -> Self {
        let scope = RunScope::new(&config.storage);
        let generator = match config.run.seed {
            Some(seed) => DatasetGenerator::with_seed(seed as u64),
            None => DatasetGenerator::new(),
        };
        Self { config, engine, fs, scope, generator }
    }

    /// Replace the run scope
    pub fn with_scope(mut self, scope: RunScope) -> Self {
        self.scope = scope;
        self
    }

    /// Run scope in use
    pub fn scope(&self) -> &RunScope {
        &self.scope
    }

    /// Effective configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            separator: self.config.write.separator,
            header: self.config.write.header,
            rows_per_file: self.config.write.rows_per_file,
        }
    }

    fn read_options(&self) -> ReadOptions {
        self.write_options().read_options()
    }

    /// Run one case to a verdict.
    ///
    /// A diagnostic that cannot be collected leaves the FAIL verdict in place
    /// and is recorded in `diagnostic_error`.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidInput`], [`HarnessError::WriteFailure`] or
    /// [`HarnessError::ReadFailure`]. No case report exists for an errored case.
    pub async fn run_case(&self, case: &TestCase) -> HarnessResult<TestCaseReport> {
        let started = Instant::now();
        let mut report = TestCaseReport::running(&case.name, case.row_count);
        let path = self.scope.case_path(&case.name);
        info!(case = %case.name, row_count = case.row_count, "Starting test case");

        let dataset = self.generator.generate(case.row_count)?;

        let writer = PersistenceWriter::new(self.engine.as_ref(), self.write_options());
        report.authoritative_count = writer.write(&dataset, &path).await?;

        let verifier =
            ConsistencyVerifier::new(self.engine.as_ref(), self.fs.as_ref(), self.read_options());
        let verification = verifier.verify(&path).await?;
        report.parts_count = verification.parts_count;
        report.whole_count = verification.whole_count;

        if report.authoritative_count == report.whole_count {
            report.status = TestStatus::Passed;
        } else {
            report.status = TestStatus::Failed;
            warn!(
                case = %case.name,
                authoritative = report.authoritative_count,
                observed = report.whole_count,
                "Row count mismatch"
            );
            let diagnostic = DuplicateDiagnostic::new(self.engine.as_ref(), self.read_options());
            match diagnostic.diagnose(&path).await {
                Ok(found) => report.diagnostic = Some(found),
                Err(e) => {
                    error!(case = %case.name, error = %e, "Diagnostic failed");
                    report.diagnostic_error = Some(e.to_string());
                },
            }
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            case = %case.name,
            status = %report.status,
            duration_ms = report.duration_ms,
            "{report}"
        );
        Ok(report)
    }

    /// Run every configured case in order
    pub async fn run(&self, observer: &mut dyn RunObserver) -> RunReport {
        let cache_enabled = self.config.run.cache_enabled;
        self.engine.conf().set(IO_CACHE_ENABLED, cache_enabled);

        let mut report = RunReport::new(self.scope.run_id(), cache_enabled);
        info!(
            run_id = %self.scope.run_id(),
            root = %self.scope.root().display(),
            cache_enabled,
            cases = self.config.tests.len(),
            "Starting run"
        );

        self.cleanup().await;

        for case in &self.config.tests {
            match self.run_case(case).await {
                Ok(case_report) => {
                    observer.case_finished(&case_report);
                    report.cases.push(case_report);
                },
                Err(e) => {
                    error!(case = %case.name, kind = e.kind(), error = %e, "Test case aborted");
                    let case_error = CaseError::new(&case.name, &e);
                    observer.case_errored(&case_error);
                    report.errors.push(case_error);
                },
            }
        }

        if self.config.run.list_files {
            for listing in self.list_artifacts().await {
                observer.artifacts_listed(&listing);
            }
        }

        report.finish(self.engine.cache_stats());

        if self.config.run.delete_data_after_testing {
            self.cleanup().await;
        }

        info!("{report}");
        report
    }

    /// Run with an overall deadline
    pub async fn run_with_timeout(
        &self,
        observer: &mut dyn RunObserver,
        timeout: Duration,
    ) -> HarnessResult<RunReport> {
        tokio::time::timeout(timeout, self.run(observer))
            .await
            .map_err(|_| HarnessError::Timeout { seconds: timeout.as_secs() })
    }

    /// Files of every case directory that exists, with sizes
    pub async fn list_artifacts(&self) -> Vec<ArtifactListing> {
        let mut listings = Vec::new();
        for case in &self.config.tests {
            let path = self.scope.case_path(&case.name);
            match self.fs.ls(&path).await {
                Ok(files) => listings.push(ArtifactListing { path, files }),
                Err(EngineError::NotFound { .. }) => {
                    debug!(path = %path.display(), "No artifacts to list");
                },
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to list artifacts"),
            }
        }
        listings
    }

    /// Remove the run's storage. Best effort; failures are logged only.
    pub async fn cleanup(&self) {
        let root = self.scope.root();
        match self.fs.rm(root, true).await {
            Ok(()) => info!(path = %root.display(), "Removed test data"),
            Err(EngineError::NotFound { .. }) => {
                debug!(path = %root.display(), "No test data to remove");
            },
            Err(e) => warn!(path = %root.display(), error = %e, "Failed to remove test data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcheck_engine::LocalFileSystem;
    use tempfile::TempDir;

    fn harness(temp_dir: &TempDir, tests: Vec<TestCase>) -> Harness {
        let mut config = HarnessConfig::default();
        config.storage.root = temp_dir.path().to_path_buf();
        config.write.rows_per_file = 40;
        config.run.seed = Some(11);
        config.tests = tests;

        let engine = Arc::new(local_engine(&config, SessionConf::new()));
        Harness::new(config, engine, Arc::new(LocalFileSystem::new()))
    }

    #[tokio::test]
    async fn test_case_passes_on_local_engine() {
        let temp_dir = TempDir::new().unwrap();
        let harness = harness(&temp_dir, vec![TestCase::new("small", 100)]);

        let report = harness.run_case(&harness.config().tests[0]).await.unwrap();
        assert_eq!(report.status, TestStatus::Passed);
        assert_eq!(report.authoritative_count, 109);
        assert_eq!(report.parts_count, 109);
        assert_eq!(report.whole_count, 109);
        assert!(report.diagnostic.is_none());
        assert!(harness.scope().case_path("small").join("_SUCCESS").is_file());
    }

    #[tokio::test]
    async fn test_cleanup_is_silent_when_nothing_exists() {
        let temp_dir = TempDir::new().unwrap();
        let harness = harness(&temp_dir, vec![TestCase::new("small", 1)]);
        harness.cleanup().await;
        assert!(!harness.scope().root().exists());
    }

    #[tokio::test]
    async fn test_run_sets_cache_flag_and_deletes_data() {
        let temp_dir = TempDir::new().unwrap();
        let mut harness = harness(&temp_dir, vec![TestCase::new("small", 20)]);
        harness.config.run.delete_data_after_testing = true;

        let report = harness.run(&mut ()).await;
        assert!(report.all_passed());
        assert!(report.cache_enabled);
        assert!(harness.engine.conf().get_bool(IO_CACHE_ENABLED, false));
        assert!(report.cache_stats.is_some());
        assert!(!harness.scope().root().exists());
    }

    #[test]
    fn test_cache_disabled_variant_settings() {
        let config = cache_disabled_config(HarnessConfig::default());
        assert!(!config.run.cache_enabled);
        assert!(config.run.delete_data_after_testing);
        assert!(!cache_disabled_session().get_bool(IO_CACHE_ENABLED, true));
        assert_eq!(DEFAULT_RUN_TIMEOUT.as_secs(), 2000);
    }
}
