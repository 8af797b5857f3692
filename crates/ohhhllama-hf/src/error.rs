//! Internal error types for metadata operations.
//!
//! These errors are internal to this crate and are mapped to
//! [`MetadataError`] at the port boundary.

use ohhhllama_core::MetadataError;
use thiserror::Error;

pub type HfResult<T> = Result<T, HfError>;

#[derive(Debug, Error)]
pub enum HfError {
    /// API request failed with an HTTP error status.
    #[error("HuggingFace request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    /// The body arrived but did not decode into the expected shape.
    #[error("Invalid response from HuggingFace: {message}")]
    InvalidResponse { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl HfError {
    pub(crate) fn decode(url: &url::Url, err: &serde_json::Error) -> Self {
        Self::InvalidResponse {
            message: format!("{url}: {err}"),
        }
    }

    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map to the port error for a lookup against `repo_id`.
    pub fn into_metadata_error(self, repo_id: &str) -> MetadataError {
        match self {
            Self::Status { status: 404, .. } => MetadataError::NotFound(repo_id.to_string()),
            Self::Status { status: 401, .. } => MetadataError::AuthRequired(repo_id.to_string()),
            Self::Status { status: 403, .. } => MetadataError::Gated(repo_id.to_string()),
            Self::Status { status, .. } if status >= 500 || status == 429 => {
                MetadataError::Network(self.to_string())
            }
            Self::Network(e) => MetadataError::Network(e.to_string()),
            other => MetadataError::InvalidResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> HfError {
        HfError::Status {
            status: code,
            url: "https://huggingface.co/api/models/org/m".to_string(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status(404).into_metadata_error("org/m"),
            MetadataError::NotFound("org/m".to_string())
        );
        assert_eq!(
            status(401).into_metadata_error("org/m"),
            MetadataError::AuthRequired("org/m".to_string())
        );
        assert_eq!(
            status(403).into_metadata_error("org/m"),
            MetadataError::Gated("org/m".to_string())
        );
        assert!(matches!(
            status(503).into_metadata_error("org/m"),
            MetadataError::Network(_)
        ));
        assert!(matches!(
            status(418).into_metadata_error("org/m"),
            MetadataError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_error_message_contains_url() {
        let msg = status(500).to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("huggingface.co"));
    }
}
