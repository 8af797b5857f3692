//! Acquisition error taxonomy as seen by the queue processor.
//!
//! Component errors (metadata, fetch, convert, import, backend) are folded
//! into [`AcquireError`] at the pipeline boundary. The processor only looks at
//! [`AcquireError::is_recoverable`] to decide between retrying and failing.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline step an error came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    Fetch,
    Convert,
    Quantize,
    Import,
    Pull,
    Archive,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::Convert => "convert",
            Self::Quantize => "quantize",
            Self::Import => "import",
            Self::Pull => "pull",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a claimed job did not complete.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq)]
pub enum AcquireError {
    /// Disk usage is over the configured threshold. Retrying cannot help.
    #[error("capacity exceeded: disk usage {usage_percent:.1}% is over the {threshold_percent:.1}% threshold")]
    CapacityExceeded {
        usage_percent: f64,
        threshold_percent: f64,
    },

    /// Neither a direct artifact nor a convertible source exists. The reason
    /// is kept verbatim for the operator.
    #[error("unsupported subject: {reason}")]
    UnsupportedSubject { reason: String },

    /// A network or tool failure that may succeed on a later attempt.
    #[error("{stage} failed: {message}")]
    Transient { stage: Stage, message: String },
}

impl AcquireError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedSubject {
            reason: reason.into(),
        }
    }

    pub fn transient(stage: Stage, message: impl Into<String>) -> Self {
        Self::Transient {
            stage,
            message: message.into(),
        }
    }

    /// Whether the processor should spend another attempt on this job.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Short category label, used as a prefix of stored job errors.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "capacity",
            Self::UnsupportedSubject { .. } => "unsupported",
            Self::Transient { .. } => "transient",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_recoverable() {
        assert!(AcquireError::transient(Stage::Fetch, "timeout").is_recoverable());
        assert!(!AcquireError::unsupported("no gguf").is_recoverable());
        assert!(
            !AcquireError::CapacityExceeded {
                usage_percent: 95.0,
                threshold_percent: 90.0
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_messages() {
        let err = AcquireError::CapacityExceeded {
            usage_percent: 95.0,
            threshold_percent: 90.0,
        };
        assert_eq!(
            err.to_string(),
            "capacity exceeded: disk usage 95.0% is over the 90.0% threshold"
        );
        assert_eq!(
            AcquireError::transient(Stage::Import, "backend down").to_string(),
            "import failed: backend down"
        );
    }
}
