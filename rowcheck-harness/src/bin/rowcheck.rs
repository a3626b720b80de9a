//! Rowcheck CLI
//!
//! # Commands
//!
//! - `rowcheck run` - Run the configured cases with the configured cache setting
//! - `rowcheck run-cache-disabled` - Run with the cache disabled for the whole session
//! - `rowcheck ls <run-id>` - List the artifacts of a run
//! - `rowcheck clean <run-id>` - Delete the artifacts of a run

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rowcheck_core::{telemetry, ConfigLoader, HarnessConfig, TestCase};
use rowcheck_engine::{FileSystem, LocalFileSystem, SessionConf};
use rowcheck_harness::{
    cache_disabled_config, cache_disabled_session, local_engine, ArtifactListing, CaseError,
    Harness, RunObserver, RunReport, RunScope, TestCaseReport,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "rowcheck")]
#[command(about = "Detect duplicate rows on cached reads of partitioned delimited data")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to rowcheck.toml or config.toml in the search paths)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured test case
    Run {
        /// Enable or disable the engine read cache
        #[arg(long)]
        cache_enabled: Option<bool>,
        /// Delete the run's data afterwards
        #[arg(long)]
        delete_after: bool,
        /// Print every case's files and sizes after the run
        #[arg(long)]
        list_files: bool,
        /// Write the JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
        /// Seed for the generated values
        #[arg(long, allow_negative_numbers = true)]
        seed: Option<i64>,
        /// Test case as name=rows; replaces the configured cases when given
        #[arg(long = "case")]
        cases: Vec<TestCase>,
    },
    /// Run with the cache disabled at session level and data deleted afterwards
    RunCacheDisabled {
        /// Overall deadline in seconds
        #[arg(long, default_value = "2000")]
        timeout_secs: u64,
        /// Write the JSON run report to this file
        #[arg(long)]
        report: Option<PathBuf>,
        /// Test case as name=rows; replaces the configured cases when given
        #[arg(long = "case")]
        cases: Vec<TestCase>,
    },
    /// List the artifacts of a run
    Ls {
        /// Run identifier
        run_id: Uuid,
    },
    /// Delete the artifacts of a run
    Clean {
        /// Run identifier
        run_id: Uuid,
    },
}

/// Prints verdicts and diagnostics to stdout
struct StdoutObserver;

impl RunObserver for StdoutObserver {
    fn case_finished(&mut self, report: &TestCaseReport) {
        println!("{report}");
        if let Some(diagnostic) = &report.diagnostic {
            println!("{diagnostic}");
        }
        if let Some(error) = &report.diagnostic_error {
            println!("Diagnostic unavailable: {error}");
        }
    }

    fn case_errored(&mut self, error: &CaseError) {
        println!("{error}");
    }

    fn artifacts_listed(&mut self, listing: &ArtifactListing) {
        print!("{listing}");
    }
}

fn tests_override(cases: &[TestCase]) -> Result<toml::Value> {
    let cases = cases
        .iter()
        .map(toml::Value::try_from)
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to encode test cases")?;
    Ok(toml::Value::Array(cases))
}

fn finish(report: &RunReport, report_path: Option<&PathBuf>) -> Result<ExitCode> {
    println!("{report}");
    if let Some(path) = report_path {
        report.write_json(path).context("Failed to write run report")?;
    }
    Ok(if report.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn harness(config: HarnessConfig, conf: SessionConf) -> Harness {
    let engine = Arc::new(local_engine(&config, conf));
    Harness::new(config, engine, Arc::new(LocalFileSystem::new()))
}

async fn list_run(config: &HarnessConfig, run_id: Uuid) -> Result<()> {
    let scope = RunScope::with_id(&config.storage, run_id);
    let fs = LocalFileSystem::new();
    let entries = fs
        .ls(scope.root())
        .await
        .with_context(|| format!("Failed to list {}", scope.root().display()))?;

    for entry in entries {
        let files = if entry.is_dir { fs.ls(&entry.path).await? } else { vec![entry.clone()] };
        print!("{}", ArtifactListing { path: entry.path, files });
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }

    match cli.command {
        Commands::Run { cache_enabled, delete_after, list_files, report, seed, cases } => {
            if let Some(enabled) = cache_enabled {
                loader = loader.with_override("run.cache_enabled", enabled);
            }
            if delete_after {
                loader = loader.with_override("run.delete_data_after_testing", true);
            }
            if list_files {
                loader = loader.with_override("run.list_files", true);
            }
            if let Some(seed) = seed {
                loader = loader.with_override("run.seed", seed);
            }
            if !cases.is_empty() {
                loader = loader.with_override("tests", tests_override(&cases)?);
            }

            let config = loader.load().context("Failed to load configuration")?;
            telemetry::init_logging(&config.telemetry)?;

            let report_path = report.or_else(|| config.run.report_path.clone());
            let harness = harness(config, SessionConf::new());
            let run_report = harness.run(&mut StdoutObserver).await;
            finish(&run_report, report_path.as_ref())
        },
        Commands::RunCacheDisabled { timeout_secs, report, cases } => {
            if !cases.is_empty() {
                loader = loader.with_override("tests", tests_override(&cases)?);
            }

            let config = loader.load().context("Failed to load configuration")?;
            let config = cache_disabled_config(config);
            telemetry::init_logging(&config.telemetry)?;

            let report_path = report.or_else(|| config.run.report_path.clone());
            let harness = harness(config, cache_disabled_session());
            let run_report = harness
                .run_with_timeout(&mut StdoutObserver, Duration::from_secs(timeout_secs))
                .await?;
            finish(&run_report, report_path.as_ref())
        },
        Commands::Ls { run_id } => {
            let config = loader.load().context("Failed to load configuration")?;
            telemetry::init_logging(&config.telemetry)?;
            list_run(&config, run_id).await?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Clean { run_id } => {
            let config = loader.load().context("Failed to load configuration")?;
            telemetry::init_logging(&config.telemetry)?;

            let scope = RunScope::with_id(&config.storage, run_id);
            harness(config, SessionConf::new()).with_scope(scope).cleanup().await;
            Ok(ExitCode::SUCCESS)
        },
    }
}
