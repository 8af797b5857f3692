//! Registering a finished artifact with the inference backend.
//!
//! The backend imports from a manifest (a Modelfile) that points at the
//! artifact and carries default runtime parameters.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ohhhllama_core::{AppConfig, BackendError, InferenceBackend, sanitize_model_name};
use thiserror::Error;

/// Stop sequences covering the common chat templates.
const DEFAULT_STOPS: &[&str] = &["<|im_end|>", "<|end|>", "</s>"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("artifact not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("failed to write manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Operator-supplied blocks added to every generated manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDefaults {
    pub system: Option<String>,
    pub template: Option<String>,
}

impl ManifestDefaults {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            system: config.system_prompt.clone(),
            template: config.chat_template.clone(),
        }
    }
}

/// Manifest describing an artifact and its runtime defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Modelfile {
    pub artifact: PathBuf,
    pub system: Option<String>,
    pub template: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub stops: Vec<String>,
}

impl Modelfile {
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
            system: None,
            template: None,
            temperature: 0.7,
            top_p: 0.9,
            stops: DEFAULT_STOPS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: &ManifestDefaults) -> Self {
        self.system.clone_from(&defaults.system);
        self.template.clone_from(&defaults.template);
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("FROM {}\n", self.artifact.display());
        if let Some(system) = &self.system {
            let _ = writeln!(out, "SYSTEM \"{}\"", system.replace('"', "\\\""));
        }
        if let Some(template) = &self.template {
            let _ = writeln!(out, "TEMPLATE {template}");
        }
        out.push('\n');
        out.push_str("# Default parameters\n");
        let _ = writeln!(out, "PARAMETER temperature {}", self.temperature);
        let _ = writeln!(out, "PARAMETER top_p {}", self.top_p);
        for stop in &self.stops {
            let _ = writeln!(out, "PARAMETER stop {stop}");
        }
        out
    }
}

/// Writes the manifest next to the artifact and hands both to the backend.
pub struct Importer {
    backend: Arc<dyn InferenceBackend>,
    defaults: ManifestDefaults,
}

impl Importer {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            defaults: ManifestDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: ManifestDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Import `artifact` under the sanitized form of `name`.
    ///
    /// Returns the name the backend now knows the model by. The manifest is
    /// removed afterwards whatever the outcome.
    pub async fn import(&self, artifact: &Path, name: &str) -> Result<String, ImportError> {
        if !artifact.is_file() {
            return Err(ImportError::MissingArtifact(artifact.to_path_buf()));
        }
        let name = sanitize_model_name(name);
        let manifest = artifact.with_file_name(format!("{name}.Modelfile"));

        let rendered = Modelfile::new(artifact)
            .with_defaults(&self.defaults)
            .render();
        tokio::fs::write(&manifest, rendered)
            .await
            .map_err(|e| ImportError::Manifest {
                path: manifest.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(target: "ohhhllama.import", manifest = %manifest.display(), "wrote manifest");

        let result = self.backend.import(&name, &manifest).await;
        let _ = tokio::fs::remove_file(&manifest).await;
        result?;

        tracing::info!(target: "ohhhllama.import", model = %name, artifact = %artifact.display(), "imported");
        Ok(name)
    }
}
