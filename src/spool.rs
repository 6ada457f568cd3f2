//! Transient on-disk staging for uploaded bytes.

use crate::error::{Result, WordFrequencyError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Writes uploads to a temporary file and reads them back, deleting the file
/// afterwards. Runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct Spool {
    dir: PathBuf,
}

impl Spool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn round_trip(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || stage(&dir, &bytes))
            .await
            .map_err(|e| WordFrequencyError::Internal {
                message: format!("Spool worker failed: {}", e),
            })?
    }
}

impl Default for Spool {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

fn stage(dir: &Path, bytes: &[u8]) -> Result<Vec<u8>> {
    let storage = |action: &str, e: std::io::Error| WordFrequencyError::Storage {
        message: format!("Failed to {} spooled upload in {}: {}", action, dir.display(), e),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| storage("create", e))?;
    file.write_all(bytes).map_err(|e| storage("write", e))?;
    file.flush().map_err(|e| storage("flush", e))?;
    let read_back = std::fs::read(file.path()).map_err(|e| storage("read", e))?;
    file.close().map_err(|e| storage("delete", e))?;
    Ok(read_back)
}
