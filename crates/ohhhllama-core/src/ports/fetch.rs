//! Download strategy port used by the fetcher.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Files to retrieve from one repository into one directory.
///
/// Each file lands at `dest_dir.join(file)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub repo_id: String,
    pub files: Vec<String>,
    pub dest_dir: PathBuf,
}

impl FetchRequest {
    pub fn single(repo_id: impl Into<String>, file: impl Into<String>, dest_dir: PathBuf) -> Self {
        Self {
            repo_id: repo_id.into(),
            files: vec![file.into()],
            dest_dir,
        }
    }

    pub fn snapshot(repo_id: impl Into<String>, files: Vec<String>, dest_dir: PathBuf) -> Self {
        Self {
            repo_id: repo_id.into(),
            files,
            dest_dir,
        }
    }
}

/// Typed failure of one strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// The strategy cannot run here (tool not installed).
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// One way of moving bytes from the metadata service to disk.
#[async_trait]
pub trait DownloadStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether partial downloads are resumed on a later attempt.
    fn resumable(&self) -> bool;

    async fn fetch(&self, request: &FetchRequest) -> Result<(), StrategyError>;
}
