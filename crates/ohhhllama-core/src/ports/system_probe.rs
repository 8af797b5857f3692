//! Disk usage probe port.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiskError {
    #[error("no mounted disk contains {0}")]
    NoDisk(String),

    #[error("disk reports zero capacity for {0}")]
    ZeroCapacity(String),
}

/// Reports how full the disk holding a path is.
pub trait DiskProbe: Send + Sync {
    /// Used space as a percentage in `0.0..=100.0`.
    fn usage_percent(&self, path: &Path) -> Result<f64, DiskError>;
}
