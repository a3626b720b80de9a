//! Local filesystem listing and removal.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::{
    error::{EngineError, EngineResult},
    traits::FileSystem,
    types::FileInfo,
};

/// [`FileSystem`] over the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a handle
    pub fn new() -> Self {
        Self
    }
}

fn file_info(path: &Path, metadata: &std::fs::Metadata) -> FileInfo {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    FileInfo {
        name,
        path: path.to_path_buf(),
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        is_dir: metadata.is_dir(),
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn ls(&self, path: &Path) -> EngineResult<Vec<FileInfo>> {
        let metadata = fs::metadata(path).await.map_err(|e| EngineError::io("stat", path, e))?;
        if !metadata.is_dir() {
            return Ok(vec![file_info(path, &metadata)]);
        }

        let mut entries =
            fs::read_dir(path).await.map_err(|e| EngineError::io("list", path, e))?;
        let mut infos = Vec::new();
        while let Some(entry) =
            entries.next_entry().await.map_err(|e| EngineError::io("list", path, e))?
        {
            let entry_path = entry.path();
            let metadata =
                entry.metadata().await.map_err(|e| EngineError::io("stat", &entry_path, e))?;
            infos.push(file_info(&entry_path, &metadata));
        }

        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn rm(&self, path: &Path, recursive: bool) -> EngineResult<()> {
        let metadata =
            fs::symlink_metadata(path).await.map_err(|e| EngineError::io("stat", path, e))?;

        let result = if !metadata.is_dir() {
            fs::remove_file(path).await
        } else if recursive {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_dir(path).await
        };
        result.map_err(|e| EngineError::io("remove", path, e))?;

        debug!(path = %path.display(), recursive, "Removed path");
        Ok(())
    }
}
