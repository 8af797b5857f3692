//! Resolver output: how a repository subject will be acquired.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Quantization;

/// A single file inside a metadata-service repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocator {
    pub repo_id: String,
    pub file: String,
}

impl SourceLocator {
    pub fn new(repo_id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            file: file.into(),
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repo_id, self.file)
    }
}

/// Why a subject cannot be acquired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// The repository declares an architecture outside the convertible set
    /// and no redistributor carries a ready artifact.
    UnknownArchitecture { architecture: String },
    /// The repository declares no usable architecture and none of the
    /// redistributor candidates carry a ready artifact.
    NoRedistributorMatch { candidates_tried: usize },
    /// The architecture is convertible but the repository publishes no
    /// weights the converter can read.
    MissingWeights { architecture: String },
    /// The only artifacts on offer are split across several files.
    ShardedArtifact { file: String },
}

impl fmt::Display for UnsupportedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArchitecture { architecture } => write!(
                f,
                "architecture '{architecture}' is not supported for conversion and no pre-built artifact was found"
            ),
            Self::NoRedistributorMatch { candidates_tried } => write!(
                f,
                "no pre-built artifact found in {candidates_tried} redistributor candidates and no convertible architecture declared"
            ),
            Self::MissingWeights { architecture } => write!(
                f,
                "architecture '{architecture}' is convertible but the repository has no .safetensors or pytorch_model .bin weights"
            ),
            Self::ShardedArtifact { file } => write!(
                f,
                "only split artifacts are available (e.g. '{file}'); multi-part artifacts cannot be imported"
            ),
        }
    }
}

/// Acquisition strategy chosen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum Plan {
    /// A ready binary artifact exists, in the requested repository or at a
    /// redistributor's alternate location.
    DirectArtifact {
        source: SourceLocator,
        /// Tag detected in the chosen filename, if any.
        quant: Option<Quantization>,
        /// True when `source` points at a redistributor rather than the request.
        alternate: bool,
    },
    /// No artifact, but the raw model can be converted.
    ConvertibleSource {
        repo_id: String,
        architecture: String,
        /// Raw files to fetch (weights, configuration, tokenizer).
        files: Vec<String>,
    },
    Unsupported { reason: UnsupportedReason },
}

impl Plan {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::DirectArtifact { .. } => "direct_artifact",
            Self::ConvertibleSource { .. } => "convertible_source",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_reasons_are_distinguishable() {
        let arch = UnsupportedReason::UnknownArchitecture {
            architecture: "BertModel".to_string(),
        }
        .to_string();
        let none = UnsupportedReason::NoRedistributorMatch {
            candidates_tried: 12,
        }
        .to_string();
        assert!(arch.contains("BertModel"));
        assert!(none.contains("12 redistributor candidates"));
        assert_ne!(arch, none);

        let weights = UnsupportedReason::MissingWeights {
            architecture: "LlamaForCausalLM".to_string(),
        }
        .to_string();
        let sharded = UnsupportedReason::ShardedArtifact {
            file: "big-00001-of-00002.gguf".to_string(),
        }
        .to_string();
        assert!(weights.contains("no .safetensors"));
        assert!(sharded.contains("big-00001-of-00002.gguf"));
    }

    #[test]
    fn test_plan_serializes_with_tag() {
        let plan = Plan::DirectArtifact {
            source: SourceLocator::new("org/model-GGUF", "model.Q4_K_M.gguf"),
            quant: Some(Quantization::Q4KM),
            alternate: false,
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["plan"], "direct_artifact");
        assert_eq!(json["quant"], "Q4_K_M");
    }
}
