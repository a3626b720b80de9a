//! Run-scoped storage namespace.

use rowcheck_core::config::StorageConfig;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Storage namespace owned by one run.
///
/// Created once at startup and passed to every stage, so separate
/// invocations never touch each other's artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScope {
    run_id: Uuid,
    root: PathBuf,
}

impl RunScope {
    /// Fresh scope with a random run id
    pub fn new(storage: &StorageConfig) -> Self {
        Self::with_id(storage, Uuid::new_v4())
    }

    /// Scope of an existing run
    pub fn with_id(storage: &StorageConfig, run_id: Uuid) -> Self {
        let root = storage.root.join(&storage.data_prefix).join(run_id.to_string());
        Self { run_id, root }
    }

    /// Run identifier
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Directory holding every case of this run
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifact directory of one test case
    pub fn case_path(&self, case_name: &str) -> PathBuf {
        self.root.join(case_name)
    }
}
