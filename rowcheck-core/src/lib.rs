//! # Rowcheck Core
//!
//! Shared foundation for the rowcheck workspace: the configuration schema and
//! its layered loader, configuration error types, the test case definition and
//! the logging bootstrap used by the harness binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rowcheck_core::config::ConfigLoader;
//! use rowcheck_core::telemetry;
//!
//! let config = ConfigLoader::new().load()?;
//! telemetry::init_logging(&config.telemetry)?;
//! for case in &config.tests {
//!     println!("{} -> {} rows", case.name, case.row_count);
//! }
//! # Ok::<(), rowcheck_core::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use crate::{
    config::{ConfigLoader, HarnessConfig},
    error::{Error, Result},
    types::TestCase,
};
