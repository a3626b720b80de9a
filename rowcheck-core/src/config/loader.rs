//! # Configuration Loading
//!
//! Builds a [`HarnessConfig`] from defaults, an optional TOML file,
//! `ROWCHECK_*` environment variables and explicit overrides, in that order.

use crate::{
    config::{schema::HarnessConfig, validator::ConfigValidator},
    Error, Result,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_NAMES: [&str; 2] = ["rowcheck.toml", "config.toml"];

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
    explicit_file: Option<PathBuf>,
    env_prefix: String,
    overrides: Vec<(String, toml::Value)>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("."), PathBuf::from("./config")];
        if let Some(dir) = dirs::config_dir() {
            search_paths.push(dir.join("rowcheck"));
        }

        Self {
            search_paths,
            explicit_file: None,
            env_prefix: "ROWCHECK".to_string(),
            overrides: Vec::new(),
        }
    }

    /// Use exactly this file instead of searching
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override a dotted key (e.g. `run.cache_enabled`) after all other sources
    pub fn with_override<V: Into<toml::Value>>(mut self, key: &str, value: V) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Load configuration from all available sources
    pub fn load(&self) -> Result<HarnessConfig> {
        self.load_with_vars(std::env::vars())
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment
    pub fn load_with_vars<I>(&self, vars: I) -> Result<HarnessConfig>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config_value = toml::Value::try_from(HarnessConfig::default()).map_err(|e| {
            Error::Configuration(format!("Failed to serialize default config: {e}"))
        })?;

        if let Some(config_path) = self.find_config_file()? {
            let file_config = Self::load_config_file(&config_path)?;
            config_value = Self::merge_config(config_value, file_config);
            info!("Loaded configuration file: {}", config_path.display());
        } else {
            debug!("No configuration file found in search paths");
        }

        for (key, value) in self.collect_env_vars(vars) {
            let parts: Vec<&str> = key.split('.').collect();
            Self::set_nested_value(&mut config_value, &parts, Self::parse_env_value(&value));
        }

        for (key, value) in &self.overrides {
            let parts: Vec<&str> = key.split('.').collect();
            Self::set_nested_value(&mut config_value, &parts, value.clone());
        }

        let config: HarnessConfig = config_value
            .try_into()
            .map_err(|e| Error::Configuration(format!("Failed to deserialize config: {e}")))?;

        ConfigValidator::validate(&config)?;

        info!("Configuration loaded and validated successfully");
        Ok(config)
    }

    /// Load a configuration file without environment or overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<HarnessConfig> {
        let path = path.as_ref();
        info!("Loading configuration from file: {}", path.display());

        let defaults = toml::Value::try_from(HarnessConfig::default()).map_err(|e| {
            Error::Configuration(format!("Failed to serialize default config: {e}"))
        })?;
        let merged = Self::merge_config(defaults, Self::load_config_file(path)?);
        let config: HarnessConfig = merged
            .try_into()
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(config: &HarnessConfig, path: P) -> Result<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), toml_string).map_err(|e| {
            Error::Configuration(format!(
                "Failed to write config to {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        info!("Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    fn find_config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.explicit_file {
            if !path.exists() {
                return Err(Error::Configuration(format!(
                    "Configuration file {} does not exist",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        for search_path in &self.search_paths {
            for config_name in CONFIG_NAMES {
                let config_path = search_path.join(config_name);
                if config_path.is_file() {
                    debug!("Found config file: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<toml::Value> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        content.parse::<toml::Value>().map_err(|e| {
            Error::Configuration(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Merge two TOML values; tables merge recursively, anything else is replaced.
    fn merge_config(mut base: toml::Value, override_value: toml::Value) -> toml::Value {
        match (&mut base, override_value) {
            (toml::Value::Table(base_table), toml::Value::Table(override_table)) => {
                for (key, value) in override_table {
                    match base_table.remove(&key) {
                        Some(existing) if existing.is_table() && value.is_table() => {
                            base_table.insert(key, Self::merge_config(existing, value));
                        },
                        _ => {
                            base_table.insert(key, value);
                        },
                    }
                }
                base
            },
            (_, value) => value,
        }
    }

    /// `ROWCHECK_RUN__CACHE_ENABLED` becomes `run.cache_enabled`.
    fn collect_env_vars<I>(&self, vars: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = format!("{}_", self.env_prefix);

        let mut env_vars: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let stripped = key.strip_prefix(&prefix)?;
                let config_key = stripped.to_lowercase().split("__").collect::<Vec<_>>().join(".");
                Some((config_key, value))
            })
            .collect();
        env_vars.sort();

        debug!("Collected {} environment variables", env_vars.len());
        env_vars
    }

    fn set_nested_value(config: &mut toml::Value, parts: &[&str], value: toml::Value) {
        let Some((first, rest)) = parts.split_first() else {
            return;
        };

        if let toml::Value::Table(table) = config {
            if rest.is_empty() {
                table.insert((*first).to_string(), value);
                return;
            }

            let entry = table
                .entry((*first).to_string())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
            Self::set_nested_value(entry, rest, value);
        }
    }

    /// Parse environment variable value to the closest TOML type
    fn parse_env_value(value: &str) -> toml::Value {
        if let Ok(bool_val) = value.parse::<bool>() {
            return toml::Value::Boolean(bool_val);
        }

        if let Ok(int_val) = value.parse::<i64>() {
            return toml::Value::Integer(int_val);
        }

        toml::Value::String(value.to_string())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestCase;
    use tempfile::TempDir;

    fn isolated_loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader {
            search_paths: vec![dir.path().to_path_buf()],
            explicit_file: None,
            env_prefix: "ROWCHECK".to_string(),
            overrides: Vec::new(),
        }
    }

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_config_loader_creation() {
        let loader = ConfigLoader::new();
        assert!(loader.search_paths.contains(&PathBuf::from(".")));
        assert_eq!(loader.env_prefix, "ROWCHECK");
    }

    #[test]
    fn test_load_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = isolated_loader(&temp_dir).load_with_vars(no_env()).unwrap();
        assert!(config.run.cache_enabled);
        assert_eq!(config.tests, TestCase::reference_suite());
    }

    #[test]
    fn test_file_found_in_search_path() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("rowcheck.toml"),
            "[write]\nrows_per_file = 5000\n\n[[tests]]\nname = \"1k\"\nrow_count = 1000\n",
        )
        .unwrap();

        let config = isolated_loader(&temp_dir).load_with_vars(no_env()).unwrap();
        assert_eq!(config.write.rows_per_file, 5000);
        assert_eq!(config.write.separator, ';');
        assert_eq!(config.tests, vec![TestCase::new("1k", 1000)]);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("config.toml"), "[run]\ncache_enabled = true\n")
            .unwrap();

        let vars = vec![
            ("ROWCHECK_RUN__CACHE_ENABLED".to_string(), "false".to_string()),
            ("ROWCHECK_STORAGE__DATA_PREFIX".to_string(), "hunt".to_string()),
            ("ROWCHECK_ENGINE__BLOCK_SIZE".to_string(), "1024".to_string()),
            ("UNRELATED_RUN__CACHE_ENABLED".to_string(), "true".to_string()),
        ];
        let config = isolated_loader(&temp_dir).load_with_vars(vars).unwrap();

        assert!(!config.run.cache_enabled);
        assert_eq!(config.storage.data_prefix, "hunt");
        assert_eq!(config.engine.block_size, 1024);
    }

    #[test]
    fn test_overrides_win_over_env() {
        let temp_dir = TempDir::new().unwrap();
        let vars = vec![("ROWCHECK_RUN__CACHE_ENABLED".to_string(), "true".to_string())];

        let config = isolated_loader(&temp_dir)
            .with_override("run.cache_enabled", false)
            .with_override("run.delete_data_after_testing", true)
            .load_with_vars(vars)
            .unwrap();

        assert!(!config.run.cache_enabled);
        assert!(config.run.delete_data_after_testing);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = isolated_loader(&temp_dir)
            .with_file(temp_dir.path().join("missing.toml"))
            .load_with_vars(no_env());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[write]\nrows_per_file = 0\n").unwrap();

        assert!(matches!(ConfigLoader::load_from_file(&path), Err(Error::Validation(_))));
    }

    #[test]
    fn test_merge_config() {
        let base: toml::Value = "[a]\nx = 1\ny = 2\n".parse().unwrap();
        let over: toml::Value = "[a]\ny = 3\n[b]\nz = 4\n".parse().unwrap();

        let merged = ConfigLoader::merge_config(base, over);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
        assert_eq!(merged["b"]["z"].as_integer(), Some(4));
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(ConfigLoader::parse_env_value("true"), toml::Value::Boolean(true));
        assert_eq!(ConfigLoader::parse_env_value("42"), toml::Value::Integer(42));
        assert_eq!(
            ConfigLoader::parse_env_value("Files"),
            toml::Value::String("Files".to_string())
        );
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("saved.toml");

        let mut config = HarnessConfig::default();
        config.run.seed = Some(7);
        config.tests = vec![TestCase::new("tiny", 3)];
        ConfigLoader::save_to_file(&config, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.run.seed, Some(7));
        assert_eq!(loaded.tests, config.tests);
    }

    #[test]
    fn test_seed_accepts_full_signed_range() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("seeded.toml");

        for seed in [i64::MAX, i64::MIN, -1] {
            let mut config = HarnessConfig::default();
            config.run.seed = Some(seed);
            ConfigLoader::save_to_file(&config, &config_path).unwrap();

            let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
            assert_eq!(loaded.run.seed, Some(seed));
        }
    }
}
