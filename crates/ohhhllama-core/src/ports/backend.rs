//! Inference and container backend ports.
//!
//! Both backends are black boxes; the core never reimplements them.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("{0}")]
    Command(String),
}

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Names of installed artifacts, as reported by the backend.
    async fn list_installed(&self) -> Result<Vec<String>, BackendError>;

    /// Backend-native fetch by name.
    async fn pull(&self, name: &str) -> Result<(), BackendError>;

    async fn delete(&self, name: &str) -> Result<(), BackendError>;

    /// Register a packaged artifact described by `manifest` under `name`.
    async fn import(&self, name: &str, manifest: &Path) -> Result<(), BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}

#[async_trait]
pub trait ContainerBackend: Send + Sync {
    async fn pull(&self, image: &str) -> Result<(), BackendError>;

    /// Write `image` to a single-file archive at `archive`.
    async fn save(&self, image: &str, archive: &Path) -> Result<(), BackendError>;
}

/// Tag the backend assumes when a name carries none.
pub const DEFAULT_TAG: &str = "latest";

/// `name` with the default tag appended when it has none.
///
/// Only the last path segment is inspected, so a registry port such as
/// `host:5000/model` is not mistaken for a tag.
pub fn with_default_tag(name: &str) -> String {
    let last = name.rsplit('/').next().unwrap_or(name);
    if last.contains(':') {
        name.to_string()
    } else {
        format!("{name}:{DEFAULT_TAG}")
    }
}

/// Whether `name` is already installed. `llama3` and `llama3:latest` are the
/// same artifact, `llama3:8b` and `llama3:70b` are not.
pub fn is_installed(installed: &[String], name: &str) -> bool {
    let wanted = with_default_tag(name);
    installed
        .iter()
        .any(|candidate| with_default_tag(candidate) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_installed() {
        let installed = vec!["llama3:latest".to_string(), "phi3:mini".to_string()];
        assert!(is_installed(&installed, "llama3"));
        assert!(is_installed(&installed, "llama3:latest"));
        assert!(is_installed(&installed, "phi3:mini"));
        assert!(!is_installed(&installed, "phi3:medium"));
        assert!(!is_installed(&installed, "phi3"));
        assert!(!is_installed(&installed, "mistral"));
        assert!(!is_installed(&[], "llama3"));
    }

    #[test]
    fn test_is_installed_untagged_entry_means_latest() {
        let installed = vec!["llama3".to_string()];
        assert!(is_installed(&installed, "llama3:latest"));
        assert!(!is_installed(&installed, "llama3:70b"));
    }

    #[test]
    fn test_with_default_tag() {
        assert_eq!(with_default_tag("llama3"), "llama3:latest");
        assert_eq!(with_default_tag("llama3:8b"), "llama3:8b");
        assert_eq!(
            with_default_tag("registry.local:5000/team/model"),
            "registry.local:5000/team/model:latest"
        );
    }
}
