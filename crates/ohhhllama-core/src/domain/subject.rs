//! What a job acquires.
//!
//! A [`Subject`] is a tagged variant with one case per [`JobKind`], so the
//! kind of a job can never disagree with the shape of its subject.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::job::JobKind;
use super::quant::Quantization;
use crate::utils::sanitize::{default_name_for_repo, sanitize_model_name};

/// Structured descriptor for a `repository-acquire` job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDescriptor {
    /// Source repository id, e.g. `org/model`.
    pub repo_id: String,
    /// Desired quantization level.
    #[serde(default)]
    pub quant: Quantization,
    /// Name to register the artifact under; derived from the repo id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_name: Option<String>,
    /// When false the job stops after fetching the raw files.
    #[serde(default = "default_convert")]
    pub convert: bool,
}

const fn default_convert() -> bool {
    true
}

impl RepoDescriptor {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            quant: Quantization::default(),
            dest_name: None,
            convert: true,
        }
    }

    #[must_use]
    pub const fn with_quant(mut self, quant: Quantization) -> Self {
        self.quant = quant;
        self
    }

    #[must_use]
    pub fn with_dest_name(mut self, name: impl Into<String>) -> Self {
        self.dest_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    /// The sanitized name the artifact is imported under.
    pub fn target_name(&self) -> String {
        self.dest_name.as_deref().map_or_else(
            || default_name_for_repo(&self.repo_id),
            sanitize_model_name,
        )
    }
}

/// The identifier of what is being acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Subject {
    /// A model the inference backend can pull natively by name.
    #[serde(rename = "binary-artifact-pull")]
    BinaryPull { name: String },
    /// A model sourced from a metadata-service repository.
    RepositoryAcquire(RepoDescriptor),
    /// An opaque container image reference.
    ContainerPull { image: String },
}

impl Subject {
    pub fn binary(name: impl Into<String>) -> Self {
        Self::BinaryPull { name: name.into() }
    }

    pub fn container(image: impl Into<String>) -> Self {
        Self::ContainerPull {
            image: image.into(),
        }
    }

    pub const fn kind(&self) -> JobKind {
        match self {
            Self::BinaryPull { .. } => JobKind::BinaryPull,
            Self::RepositoryAcquire(_) => JobKind::RepositoryAcquire,
            Self::ContainerPull { .. } => JobKind::ContainerPull,
        }
    }

    /// Reject subjects that cannot name anything.
    pub fn validate(&self) -> Result<(), String> {
        let (field, value) = match self {
            Self::BinaryPull { name } => ("name", name),
            Self::RepositoryAcquire(desc) => {
                let repo = desc.repo_id.trim();
                if !repo.is_empty() && !repo.contains('/') {
                    return Err(format!("repo_id '{repo}' must look like 'owner/name'"));
                }
                ("repo_id", &desc.repo_id)
            }
            Self::ContainerPull { image } => ("image", image),
        };
        if value.trim().is_empty() {
            return Err(format!("{field} must not be empty"));
        }
        Ok(())
    }

    /// Normalized `(kind, subject)` key used to reject duplicate active jobs.
    ///
    /// Repository descriptors key on repo id, destination name and quantization,
    /// never on the encoded text, so equivalent descriptors always collide.
    pub fn dedup_key(&self) -> String {
        let body = match self {
            Self::BinaryPull { name } => with_default_tag(&name.trim().to_lowercase()),
            Self::RepositoryAcquire(desc) => format!(
                "{}|{}|{}",
                desc.repo_id.trim().to_lowercase(),
                desc.target_name(),
                desc.quant
            ),
            Self::ContainerPull { image } => with_default_tag(&image.trim().to_lowercase()),
        };
        format!("{}:{body}", self.kind())
    }
}

/// Append `:latest` when a reference carries no tag or digest.
fn with_default_tag(reference: &str) -> String {
    let last_segment = reference.rsplit('/').next().unwrap_or(reference);
    if last_segment.contains(':') || last_segment.contains('@') {
        reference.to_string()
    } else {
        format!("{reference}:latest")
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinaryPull { name } => f.write_str(name),
            Self::RepositoryAcquire(desc) => write!(f, "{}@{}", desc.repo_id, desc.quant),
            Self::ContainerPull { image } => f.write_str(image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_defaults_on_deserialize() {
        let subject: Subject =
            serde_json::from_str(r#"{"kind":"repository-acquire","repo_id":"org/model-GGUF"}"#)
                .unwrap();
        let Subject::RepositoryAcquire(desc) = subject else {
            panic!("expected repository subject");
        };
        assert_eq!(desc.quant, Quantization::Q4KM);
        assert!(desc.convert);
        assert!(desc.dest_name.is_none());
    }

    #[test]
    fn test_dedup_key_ignores_field_order() {
        let a: Subject = serde_json::from_str(
            r#"{"kind":"repository-acquire","repo_id":"org/model-GGUF","quant":"Q4_K_M","convert":true}"#,
        )
        .unwrap();
        let b: Subject = serde_json::from_str(
            r#"{"convert":true,"quant":"q4_k_m","repo_id":"org/model-GGUF","kind":"repository-acquire"}"#,
        )
        .unwrap();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_distinguishes_quant_and_name() {
        let base = RepoDescriptor::new("org/model");
        let q8 = Subject::RepositoryAcquire(base.clone().with_quant(Quantization::Q8_0));
        let named = Subject::RepositoryAcquire(base.clone().with_dest_name("other"));
        let plain = Subject::RepositoryAcquire(base);
        assert_ne!(plain.dedup_key(), q8.dedup_key());
        assert_ne!(plain.dedup_key(), named.dedup_key());
    }

    #[test]
    fn test_dedup_key_default_dest_name_matches_explicit() {
        let implicit = Subject::RepositoryAcquire(RepoDescriptor::new("org/My_Model"));
        let explicit =
            Subject::RepositoryAcquire(RepoDescriptor::new("org/My_Model").with_dest_name("my-model"));
        assert_eq!(implicit.dedup_key(), explicit.dedup_key());
    }

    #[test]
    fn test_binary_and_container_keys_default_tag() {
        assert_eq!(
            Subject::binary("Llama3").dedup_key(),
            Subject::binary("llama3:latest").dedup_key()
        );
        assert_ne!(
            Subject::binary("llama3:8b").dedup_key(),
            Subject::binary("llama3").dedup_key()
        );
        assert_eq!(
            Subject::container("nginx").dedup_key(),
            "container-pull:nginx:latest"
        );
        assert_eq!(
            Subject::container("localhost:5000/app").dedup_key(),
            "container-pull:localhost:5000/app:latest"
        );
    }

    #[test]
    fn test_same_name_different_kind_does_not_collide() {
        assert_ne!(
            Subject::binary("nginx").dedup_key(),
            Subject::container("nginx").dedup_key()
        );
    }

    #[test]
    fn test_validate() {
        assert!(Subject::binary("  ").validate().is_err());
        assert!(Subject::RepositoryAcquire(RepoDescriptor::new("noslash")).validate().is_err());
        assert!(Subject::RepositoryAcquire(RepoDescriptor::new("a/b")).validate().is_ok());
        assert!(Subject::container("redis:7").validate().is_ok());
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_value(Subject::binary("llama3")).unwrap();
        assert_eq!(json["kind"], "binary-artifact-pull");
        let json = serde_json::to_value(Subject::container("redis")).unwrap();
        assert_eq!(json["kind"], "container-pull");
    }
}
