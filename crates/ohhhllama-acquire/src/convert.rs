//! llama.cpp conversion and quantization.
//!
//! Conversion runs the repository's `convert_hf_to_gguf.py` with the
//! configured Python interpreter; quantization runs `llama-quantize`. Both
//! remove their output file when they fail so a retry starts clean.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ohhhllama_core::{AppConfig, ConvertError, ModelConverter, Quantization};
use tokio::process::Command;

use crate::process::{ToolError, locate, run_tool};

const CONVERT_SCRIPT: &str = "convert_hf_to_gguf.py";
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const QUANTIZE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Intermediate file name for the full-precision conversion output.
pub fn intermediate_name(name: &str) -> String {
    format!("{name}_F16.gguf")
}

/// Final artifact file name: `<name>_<QUANT>.gguf`.
pub fn artifact_name(name: &str, quant: Quantization) -> String {
    format!("{name}_{quant}.gguf")
}

pub struct LlamaCppConverter {
    llama_cpp_dir: PathBuf,
    python_bin: String,
    quantize_bin: Option<PathBuf>,
}

impl LlamaCppConverter {
    pub fn new(llama_cpp_dir: impl Into<PathBuf>, python_bin: impl Into<String>) -> Self {
        Self {
            llama_cpp_dir: llama_cpp_dir.into(),
            python_bin: python_bin.into(),
            quantize_bin: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.llama_cpp_dir, &config.python_bin)
    }

    /// Use a specific quantize binary instead of searching for one.
    #[must_use]
    pub fn with_quantize_bin(mut self, path: impl Into<PathBuf>) -> Self {
        self.quantize_bin = Some(path.into());
        self
    }

    /// Locate the quantize tool: checkout locations first, then `PATH`.
    pub fn find_quantize(&self) -> Result<PathBuf, ConvertError> {
        if let Some(path) = &self.quantize_bin {
            return Ok(path.clone());
        }
        let candidates = [
            self.llama_cpp_dir.join("llama-quantize"),
            self.llama_cpp_dir.join("quantize"),
            self.llama_cpp_dir.join("build").join("bin").join("llama-quantize"),
        ];
        if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
            return Ok(found);
        }
        locate("llama-quantize")
            .map_err(|_| ConvertError::ToolMissing("llama-quantize".to_string()))
    }
}

fn tool_error(err: ToolError) -> ConvertError {
    match err {
        ToolError::NotFound { tool } => ConvertError::ToolMissing(tool),
        ToolError::Failed { tool, stderr, .. } => ConvertError::Failed {
            tool,
            reason: stderr,
        },
        other => ConvertError::Failed {
            tool: "subprocess".to_string(),
            reason: other.to_string(),
        },
    }
}

/// Remove a partial output, ignoring "already gone".
async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(target: "ohhhllama.convert", path = %path.display(), error = %e, "could not remove partial output");
        }
    }
}

/// Run `cmd`, insisting that it leaves `output` behind; clean up otherwise.
async fn produce(
    cmd: Command,
    tool: &str,
    timeout: Duration,
    output: &Path,
) -> Result<(), ConvertError> {
    let result = run_tool(cmd, tool, timeout).await.map_err(tool_error);
    match result {
        Ok(_) if output.is_file() => Ok(()),
        Ok(_) => {
            discard(output).await;
            Err(ConvertError::Failed {
                tool: tool.to_string(),
                reason: format!("produced no output at {}", output.display()),
            })
        }
        Err(e) => {
            discard(output).await;
            Err(e)
        }
    }
}

#[async_trait]
impl ModelConverter for LlamaCppConverter {
    async fn convert(&self, raw_dir: &Path, output: &Path) -> Result<(), ConvertError> {
        let script = self.llama_cpp_dir.join(CONVERT_SCRIPT);
        if !script.is_file() {
            return Err(ConvertError::ToolMissing(script.display().to_string()));
        }
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConvertError::Io(e.to_string()))?;
        }

        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(&script)
            .arg(raw_dir)
            .arg("--outfile")
            .arg(output)
            .arg("--outtype")
            .arg("f16")
            .current_dir(&self.llama_cpp_dir);

        produce(cmd, CONVERT_SCRIPT, CONVERT_TIMEOUT, output).await
    }

    async fn quantize(
        &self,
        input: &Path,
        output: &Path,
        level: Quantization,
    ) -> Result<(), ConvertError> {
        let binary = self.find_quantize()?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConvertError::Io(e.to_string()))?;
        }

        let mut cmd = Command::new(&binary);
        cmd.arg(input).arg(output).arg(level.as_str());

        produce(cmd, "llama-quantize", QUANTIZE_TIMEOUT, output).await
    }
}
