//! Repository resolution.
//!
//! Decides whether a requested repository can be served by fetching a
//! ready-made artifact, must be converted from raw weights, or cannot be
//! handled at all. All lookups go through the
//! [`MetadataClient`](ohhhllama_core::MetadataClient) port.

mod select;

use std::sync::Arc;

use ohhhllama_core::{
    AcquireError, MetadataClient, MetadataError, Plan, Quantization, SourceLocator, Stage,
    UnsupportedReason,
};

pub use select::{
    Selection, is_artifact, is_shard, is_snapshot_file, is_weight_file, select_artifact,
    snapshot_files,
};

/// Architectures the converter knows how to translate.
pub const SUPPORTED_ARCHITECTURES: &[&str] = &[
    "LlamaForCausalLM",
    "MistralForCausalLM",
    "MixtralForCausalLM",
    "Qwen2ForCausalLM",
    "PhiForCausalLM",
    "Phi3ForCausalLM",
    "GemmaForCausalLM",
    "Gemma2ForCausalLM",
    "FalconForCausalLM",
    "GPT2LMHeadModel",
    "GPTNeoXForCausalLM",
    "StableLmForCausalLM",
    "OlmoForCausalLM",
];

/// Namespaces known to publish pre-built artifacts, searched in order.
pub const REDISTRIBUTORS: &[&str] = &["TheBloke", "bartowski", "QuantFactory", "mradermacher"];

pub fn is_supported_architecture(architecture: &str) -> bool {
    SUPPORTED_ARCHITECTURES.contains(&architecture)
}

/// Alternate repositories that might carry artifacts for `repo_id`, in search order.
pub fn redistributor_candidates(repo_id: &str) -> Vec<String> {
    let name = repo_id.rsplit('/').next().unwrap_or(repo_id);
    let variants = [
        name.to_string(),
        name.replace('-', "_"),
        name.replace('_', "-"),
    ];

    let mut candidates: Vec<String> = Vec::new();
    for namespace in REDISTRIBUTORS {
        for variant in &variants {
            for candidate in [
                format!("{namespace}/{variant}-GGUF"),
                format!("{namespace}/{variant}-gguf"),
                format!("{namespace}/{}-GGUF", variant.to_lowercase()),
            ] {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
    }
    candidates
}

/// Map a metadata failure on the requested repository to the processor taxonomy.
fn lookup_error(err: MetadataError) -> AcquireError {
    if err.is_permanent() {
        AcquireError::unsupported(err.to_string())
    } else {
        AcquireError::transient(Stage::Resolve, err.to_string())
    }
}

fn first_shard_of(files: &[String]) -> Option<String> {
    files
        .iter()
        .filter(|f| is_artifact(f) && is_shard(f))
        .min()
        .cloned()
}

/// Turns a repository request into a [`Plan`].
pub struct Resolver {
    metadata: Arc<dyn MetadataClient>,
}

impl Resolver {
    pub fn new(metadata: Arc<dyn MetadataClient>) -> Self {
        Self { metadata }
    }

    /// Resolve `repo_id` for the requested quantization level.
    ///
    /// Permanent metadata failures (unknown, gated or private repository)
    /// come back as [`AcquireError::UnsupportedSubject`]; network trouble is
    /// [`AcquireError::Transient`] so the processor can retry.
    ///
    /// When nothing usable turns up, the most specific reason wins: weightless
    /// convertible repository, then unknown architecture, then split-only
    /// artifacts, then no redistributor match.
    pub async fn resolve(
        &self,
        repo_id: &str,
        quant: Quantization,
    ) -> Result<Plan, AcquireError> {
        let files = self
            .metadata
            .list_files(repo_id)
            .await
            .map_err(lookup_error)?;
        let mut first_shard = first_shard_of(&files);

        if let Some(selection) = select_artifact(&files, quant) {
            tracing::info!(
                target: "ohhhllama.resolver",
                repo = %repo_id,
                file = %selection.file,
                requested = %quant,
                "repository carries a ready artifact"
            );
            return Ok(Plan::DirectArtifact {
                source: SourceLocator::new(repo_id, selection.file),
                quant: selection.quant,
                alternate: false,
            });
        }

        let architecture = self
            .metadata
            .architecture(repo_id)
            .await
            .map_err(lookup_error)?;

        let mut missing_weights = false;
        if let Some(arch) = architecture.as_deref() {
            if is_supported_architecture(arch) {
                if let Some(snapshot) = snapshot_files(&files) {
                    tracing::info!(
                        target: "ohhhllama.resolver",
                        repo = %repo_id,
                        architecture = %arch,
                        files = snapshot.len(),
                        "repository is convertible"
                    );
                    return Ok(Plan::ConvertibleSource {
                        repo_id: repo_id.to_string(),
                        architecture: arch.to_string(),
                        files: snapshot,
                    });
                }
                missing_weights = true;
                tracing::warn!(target: "ohhhllama.resolver", repo = %repo_id, architecture = %arch, "convertible architecture but no weights published");
            } else {
                tracing::warn!(target: "ohhhllama.resolver", repo = %repo_id, architecture = %arch, "architecture not supported for conversion");
            }
        }

        let candidates = redistributor_candidates(repo_id);
        for candidate in &candidates {
            tracing::debug!(target: "ohhhllama.resolver", candidate = %candidate, "checking redistributor");
            let listing = match self.metadata.list_files(candidate).await {
                Ok(listing) => listing,
                Err(e) if e.is_permanent() => continue,
                Err(e) => return Err(AcquireError::transient(Stage::Resolve, e.to_string())),
            };
            if first_shard.is_none() {
                first_shard = first_shard_of(&listing);
            }
            if let Some(selection) = select_artifact(&listing, quant) {
                tracing::info!(
                    target: "ohhhllama.resolver",
                    repo = %repo_id,
                    alternate = %candidate,
                    file = %selection.file,
                    "found artifact at redistributor"
                );
                return Ok(Plan::DirectArtifact {
                    source: SourceLocator::new(candidate.clone(), selection.file),
                    quant: selection.quant,
                    alternate: true,
                });
            }
        }

        let reason = match (architecture, first_shard) {
            (Some(architecture), _) if missing_weights => {
                UnsupportedReason::MissingWeights { architecture }
            }
            (Some(architecture), _) => UnsupportedReason::UnknownArchitecture { architecture },
            (None, Some(file)) => UnsupportedReason::ShardedArtifact { file },
            (None, None) => UnsupportedReason::NoRedistributorMatch {
                candidates_tried: candidates.len(),
            },
        };
        tracing::warn!(target: "ohhhllama.resolver", repo = %repo_id, %reason, "repository is unsupported");
        Ok(Plan::Unsupported { reason })
    }
}
