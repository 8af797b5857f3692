//! Model conversion and quantization port.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::Quantization;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("tool not found: {0}")]
    ToolMissing(String),

    #[error("{tool} failed: {reason}")]
    Failed { tool: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}

/// Format translation followed by precision reduction.
#[async_trait]
pub trait ModelConverter: Send + Sync {
    /// Translate a raw model directory into a full-precision artifact at `output`.
    async fn convert(&self, raw_dir: &Path, output: &Path) -> Result<(), ConvertError>;

    /// Reduce `input` to `level`, writing `output`.
    async fn quantize(
        &self,
        input: &Path,
        output: &Path,
        level: Quantization,
    ) -> Result<(), ConvertError>;
}
