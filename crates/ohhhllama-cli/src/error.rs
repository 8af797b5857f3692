//! CLI-specific error types and mappings to exit codes.

use ohhhllama_acquire::{FetchError, ProcessorError};
use ohhhllama_core::{AcquireError, CoreError, QueueError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// The request was understood but refused (not removable, unsupported).
    #[error("{0}")]
    Refused(String),

    /// A collaborator (metadata service, backend, tools) failed.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl CliError {
    /// Map error to an exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) | Self::Refused(_) => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Database(_) => 73,    // EX_CANTCREAT
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Repository(repo_err) => repo_err.into(),
            CoreError::Queue(queue_err) => queue_err.into(),
            CoreError::Metadata(e) => Self::Unavailable(e.to_string()),
            CoreError::Backend(e) => Self::Unavailable(e.to_string()),
            CoreError::Validation(msg) => Self::Arguments(msg),
            CoreError::Configuration(msg) => Self::Config(msg),
            CoreError::Internal(msg) => Self::Core(msg),
        }
    }
}

impl From<RepositoryError> for CliError {
    fn from(err: RepositoryError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<QueueError> for CliError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Validation(msg) => Self::Arguments(msg),
            QueueError::NotRemovable(_) | QueueError::DuplicateJob { .. } => {
                Self::Refused(err.to_string())
            }
            QueueError::Repository(e) => e.into(),
            QueueError::InvalidTransition { .. } => Self::Core(err.to_string()),
        }
    }
}

impl From<ProcessorError> for CliError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::Queue(e) => e.into(),
        }
    }
}

impl From<AcquireError> for CliError {
    fn from(err: AcquireError) -> Self {
        if err.is_recoverable() {
            Self::Unavailable(err.to_string())
        } else {
            Self::Refused(err.to_string())
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        Self::Core(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohhhllama_core::{JobId, NotRemovableReason, Stage};

    #[test]
    fn test_exit_codes() {
        let err: CliError = QueueError::NotRemovable(NotRemovableReason::InProgress(JobId(3))).into();
        assert_eq!(err.exit_code(), 1);

        let err: CliError = CoreError::Configuration("bad".to_string()).into();
        assert_eq!(err.exit_code(), 78);

        let err: CliError = RepositoryError::Storage("locked".to_string()).into();
        assert_eq!(err.exit_code(), 73);

        let err: CliError = AcquireError::transient(Stage::Resolve, "timeout").into();
        assert_eq!(err.exit_code(), 69);
    }
}
