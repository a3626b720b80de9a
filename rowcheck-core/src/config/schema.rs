//! Configuration schema definitions for rowcheck
//!
//! All structures derive serde for TOML loading and `validator::Validate` for
//! field-level constraints. Cross-field rules live in [`super::validator`].
//! Layering is defaults → file → environment → command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::types::TestCase;

/// Root configuration for a harness run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HarnessConfig {
    /// Run parameters (the two external toggles and reporting)
    #[validate(nested)]
    pub run: RunConfig,

    /// Where run artifacts are placed
    #[validate(nested)]
    pub storage: StorageConfig,

    /// Delimited output settings
    #[validate(nested)]
    pub write: WriteConfig,

    /// Engine tuning
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Logging
    #[validate(nested)]
    pub telemetry: TelemetryConfig,

    /// Scale points, executed in order
    #[validate(nested)]
    pub tests: Vec<TestCase>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            storage: StorageConfig::default(),
            write: WriteConfig::default(),
            engine: EngineConfig::default(),
            telemetry: TelemetryConfig::default(),
            tests: TestCase::reference_suite(),
        }
    }
}

/// External run parameters.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RunConfig {
    /// Whether the engine read cache is enabled for the run
    pub cache_enabled: bool,

    /// Delete the run's artifacts after all cases completed
    pub delete_data_after_testing: bool,

    /// Print every case's files and sizes after the run
    pub list_files: bool,

    /// Write the JSON run report here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,

    /// Seed for the opaque field generator; unseeded when absent. Signed
    /// because TOML integers are; the generator uses its bit pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            delete_data_after_testing: false,
            list_files: false,
            report_path: None,
            seed: None,
        }
    }
}

/// Storage layout. Each run writes under `root/data_prefix/<run id>`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory
    pub root: PathBuf,

    /// Directory below `root` that holds all runs
    #[validate(length(min = 1))]
    pub data_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { root: PathBuf::from("Files"), data_prefix: "bug_hunt/data".to_string() }
    }
}

/// Delimited text output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct WriteConfig {
    /// Field separator
    pub separator: char,

    /// Emit a header line at the top of each part file
    pub header: bool,

    /// Rows per part file before a new part is started
    #[validate(range(min = 1))]
    pub rows_per_file: u64,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self { separator: ';', header: true, rows_per_file: 1_000_000 }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    /// Read block size in bytes
    #[validate(range(min = 1, max = 1_073_741_824))]
    pub block_size: u64,

    /// Upper bound of bytes held by the read cache
    pub cache_capacity_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { block_size: 4 * 1024 * 1024, cache_capacity_bytes: 1024 * 1024 * 1024 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `rowcheck_engine=debug,info`
    #[validate(length(min = 1))]
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = HarnessConfig::default();
        assert!(config.run.cache_enabled);
        assert!(!config.run.delete_data_after_testing);
        assert_eq!(config.write.separator, ';');
        assert!(config.write.header);
        assert_eq!(config.storage.data_prefix, "bug_hunt/data");
        assert_eq!(config.tests.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: HarnessConfig = toml::from_str(
            r#"
            [run]
            cache_enabled = false

            [[tests]]
            name = "small"
            row_count = 10
            "#,
        )
        .unwrap();

        assert!(!config.run.cache_enabled);
        assert_eq!(config.tests, vec![TestCase::new("small", 10)]);
        assert_eq!(config.write.rows_per_file, 1_000_000);
        assert_eq!(config.telemetry.format, LogFormat::Text);
    }

    #[test]
    fn test_field_validation() {
        let mut config = HarnessConfig::default();
        config.write.rows_per_file = 0;
        assert!(config.validate().is_err());

        let mut config = HarnessConfig::default();
        config.tests.push(TestCase::new("", 5));
        assert!(config.validate().is_err());
    }
}
