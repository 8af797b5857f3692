//! Core domain types and port definitions for the ohhhllama acquisition queue.
//!
//! This crate has no storage, network or process dependencies. Adapters in
//! the sibling crates implement the traits in [`ports`].

pub mod acquire;
pub mod config;
pub mod domain;
pub mod ports;
pub mod retry;
pub mod utils;

pub use acquire::{AcquireError, Plan, SourceLocator, Stage, UnsupportedReason};
pub use config::AppConfig;
pub use domain::{
    Job, JobId, JobKind, JobStatus, Quantization, RepoDescriptor, StatusCounts, Subject,
};
pub use ports::{
    BackendError, Clock, ContainerBackend, ConvertError, CoreError, DiskError, DiskProbe,
    DownloadStrategy, FetchRequest, InferenceBackend, JobStore, MetadataClient, MetadataError,
    ModelConverter, NotRemovableReason, QueueError, RateDecision, RateLimiter, RepositoryError,
    Sleeper, Stores, StrategyError, SystemClock, TokioSleeper,
};
pub use retry::{Backoff, RetryPolicy};
pub use utils::{archive_name_for_image, default_name_for_repo, sanitize_model_name};
