//! Configuration management for rowcheck
//!
//! - Schema-driven configuration with `validator` constraints
//! - Multi-source loading (defaults, TOML file, environment, explicit overrides)
//! - Cross-field validation
//!
//! ```rust,no_run
//! use rowcheck_core::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_override("run.cache_enabled", false)
//!     .load()
//!     .expect("Failed to load configuration");
//! assert!(!config.run.cache_enabled);
//! ```

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::ConfigValidator;

