//! # Rowcheck Harness
//!
//! Reproduces duplicate or lost rows when partitioned delimited data is read
//! back through an engine's read cache. For every configured scale point the
//! harness generates a dataset with a known cardinality, persists it, counts
//! it back per file and as a whole directory, and reports PASS or FAIL. A
//! failed case is followed by a diagnostic listing duplicated `row_id`s and
//! header lines that leaked into the data.
//!
//! ```rust,no_run
//! use rowcheck_core::ConfigLoader;
//! use rowcheck_engine::{LocalFileSystem, SessionConf};
//! use rowcheck_harness::{local_engine, Harness};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConfigLoader::new().load()?;
//! let engine = Arc::new(local_engine(&config, SessionConf::new()));
//! let harness = Harness::new(config, engine, Arc::new(LocalFileSystem::new()));
//! let report = harness.run(&mut ()).await;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dataset;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod generator;
pub mod reporting;
pub mod scope;
pub mod verifier;
pub mod writer;

pub use dataset::{Dataset, SyntheticRecord, COLUMNS};
pub use diagnostic::{DiagnosticReport, DuplicateDiagnostic, DuplicateKey};
pub use driver::{
    cache_disabled_config, cache_disabled_session, local_engine, Harness, RunObserver,
    DEFAULT_RUN_TIMEOUT,
};
pub use error::{HarnessError, HarnessResult};
pub use generator::DatasetGenerator;
pub use reporting::{ArtifactListing, CaseError, RunReport, TestCaseReport, TestStatus};
pub use scope::RunScope;
pub use verifier::{ConsistencyVerifier, Verification};
pub use writer::PersistenceWriter;
