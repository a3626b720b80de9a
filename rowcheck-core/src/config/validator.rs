//! # Configuration Validation
//!
//! Field constraints come from the `validator` derives on the schema; this
//! module adds the cross-field rules.

use crate::{config::schema::HarnessConfig, Error, Result};
use std::collections::HashSet;
use tracing::{debug, warn};
use validator::Validate;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration
    pub fn validate(config: &HarnessConfig) -> Result<()> {
        debug!("Starting configuration validation");

        config.validate().map_err(Error::from)?;

        Self::validate_write_config(config)?;
        Self::validate_engine_config(config);
        Self::validate_test_cases(config)?;

        debug!("Configuration validation completed successfully");
        Ok(())
    }

    fn validate_write_config(config: &HarnessConfig) -> Result<()> {
        let separator = config.write.separator;
        if matches!(separator, '"' | '\n' | '\r') {
            return Err(Error::Validation(format!(
                "Separator {separator:?} cannot be used in delimited output"
            )));
        }

        // Diagnostics and read-back look columns up by name.
        if !config.write.header {
            return Err(Error::Validation(
                "write.header must be true; data is read back by column name".to_string(),
            ));
        }

        if config.write.rows_per_file < 1_000 {
            warn!(
                "rows_per_file = {} will produce a very large number of part files",
                config.write.rows_per_file
            );
        }

        Ok(())
    }

    fn validate_engine_config(config: &HarnessConfig) {
        if config.engine.cache_capacity_bytes < config.engine.block_size {
            warn!(
                "Cache capacity ({} bytes) is smaller than one block ({} bytes); nothing will stay cached",
                config.engine.cache_capacity_bytes, config.engine.block_size
            );
        }
    }

    fn validate_test_cases(config: &HarnessConfig) -> Result<()> {
        if config.tests.is_empty() {
            return Err(Error::Validation("At least one test case is required".to_string()));
        }

        let mut seen = HashSet::new();
        for case in &config.tests {
            let name = case.name.as_str();
            if name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(Error::Validation(format!(
                    "Test case name '{name}' must be a single path segment"
                )));
            }

            if !seen.insert(name) {
                return Err(Error::Validation(format!("Duplicate test case name '{name}'")));
            }

            if case.row_count == 0 {
                warn!("Test case '{name}' has row_count 0 and will be rejected at generation");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestCase;

    #[test]
    fn test_default_config_is_valid() {
        ConfigValidator::validate(&HarnessConfig::default()).unwrap();
    }

    #[test]
    fn test_rejects_quote_separator() {
        let mut config = HarnessConfig::default();
        config.write.separator = '"';
        assert!(matches!(ConfigValidator::validate(&config), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_headerless_output() {
        let mut config = HarnessConfig::default();
        config.write.header = false;
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("write.header"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut config = HarnessConfig::default();
        config.tests = vec![TestCase::new("a", 1), TestCase::new("a", 2)];
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("Duplicate test case name 'a'"));
    }

    #[test]
    fn test_rejects_path_like_names() {
        for name in ["..", "a/b", "c\\d"] {
            let mut config = HarnessConfig::default();
            config.tests = vec![TestCase::new(name, 1)];
            assert!(ConfigValidator::validate(&config).is_err(), "{name} accepted");
        }
    }

    #[test]
    fn test_rejects_empty_suite() {
        let mut config = HarnessConfig::default();
        config.tests.clear();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_row_count_is_not_a_config_error() {
        let mut config = HarnessConfig::default();
        config.tests = vec![TestCase::new("zero", 0)];
        ConfigValidator::validate(&config).unwrap();
    }
}
