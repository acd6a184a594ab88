//! File path utilities for the data directory.
//!
//! The data directory holds the storage database and the logs unless the
//! config points them elsewhere.

use std::path::{Path, PathBuf};

/// File path manager for data files
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory and any configured directories, which
    /// may live outside the root.
    pub fn create_dirs(&self, extra: &[&Path]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;

        for dir in extra.iter().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        Ok(())
    }
}
