//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the queue and the acquisition pipeline expect
//! from infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Async ports use `async_trait` and are `Send + Sync` so they can live
//!   behind `Arc<dyn _>`
//! - Error enums are per port; [`CoreError`] aggregates them for callers that
//!   only need a message and an exit code

pub mod backend;
pub mod clock;
pub mod converter;
pub mod fetch;
pub mod job_store;
pub mod metadata;
pub mod rate_limiter;
pub mod system_probe;

use std::sync::Arc;
use thiserror::Error;

pub use backend::{BackendError, ContainerBackend, InferenceBackend, is_installed};
pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use converter::{ConvertError, ModelConverter};
pub use fetch::{DownloadStrategy, FetchRequest, StrategyError};
pub use job_store::{JobStore, NotRemovableReason, QueueError};
pub use metadata::{MetadataClient, MetadataError};
pub use rate_limiter::{RateDecision, RateLimiter};
pub use system_probe::{DiskError, DiskProbe};

/// Container for the persistent stores.
///
/// Lives in core so that adapters can accept it without depending on the
/// storage crate.
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl Stores {
    pub fn new(jobs: Arc<dyn JobStore>, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self { jobs, rate_limiter }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A constraint was violated (e.g., unique or check constraint).
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// Core error type for semantic domain errors.
///
/// Adapters map this to their own error types (HTTP status codes, CLI exit codes).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}
