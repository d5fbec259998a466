//! Where exported reports end up.
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ApiError;

#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Store `bytes` under `filename` and return where they went.
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ApiError>;
}

/// Writes downloads into a local directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ApiError> {
        // keep the file inside the directory whatever the name looks like
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| {
                ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file name: {filename:?}"),
                ))
            })?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "download saved");
        Ok(path)
    }
}
