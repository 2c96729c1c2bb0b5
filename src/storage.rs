//! File system access behind a capability trait.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// File access used by the pipeline, injected so tests can run against a
/// scratch directory or a stub.
pub trait Storage {
    /// Reads the entire file at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Writes `bytes` to `path`, creating parent directories as needed.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Storage backed by the local file system.
#[derive(Debug, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path.display()))
    }
}
