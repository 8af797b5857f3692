//! Metadata service port (repository manifests and model configuration).

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the metadata service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("authentication required for {0}; set HF_TOKEN")]
    AuthRequired(String),

    #[error("access to {0} is gated; accept the license and set HF_TOKEN")]
    Gated(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl MetadataError {
    /// Errors that no amount of retrying will fix.
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::AuthRequired(_) | Self::Gated(_)
        )
    }
}

/// Lookup capability used by the resolver.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Every filename in the repository.
    async fn list_files(&self, repo_id: &str) -> Result<Vec<String>, MetadataError>;

    /// First declared architecture in the repository's `config.json`.
    /// `Ok(None)` when the repository has no configuration or declares none.
    async fn architecture(&self, repo_id: &str) -> Result<Option<String>, MetadataError>;
}
