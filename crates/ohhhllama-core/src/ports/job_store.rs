//! Queue store port.
//!
//! The store exclusively owns job persistence. Every mutation is atomic with
//! respect to concurrent callers: two `claim_next` calls never return the
//! same job and two `enqueue` calls for one dedup key never both succeed.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::RepositoryError;
use crate::domain::{Job, JobId, JobStatus, StatusCounts, Subject};

/// Why `remove_pending` refused to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotRemovableReason {
    /// The matching job has already been claimed.
    InProgress(JobId),
    /// No active job matches the subject.
    Absent,
}

impl fmt::Display for NotRemovableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress(id) => write!(f, "job {id} is in progress"),
            Self::Absent => f.write_str("no pending job matches"),
        }
    }
}

/// Errors surfaced by queue store operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A non-terminal job with the same dedup key already exists.
    #[error("already queued as job {existing} ({dedup_key})")]
    DuplicateJob { existing: JobId, dedup_key: String },

    /// Deletion requested on a job that is in progress or absent.
    #[error("not removable: {0}")]
    NotRemovable(NotRemovableReason),

    /// A status transition was requested from the wrong state.
    #[error("job {id} is {actual}, expected {expected}")]
    InvalidTransition {
        id: JobId,
        expected: JobStatus,
        actual: String,
    },

    #[error("invalid subject: {0}")]
    Validation(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Persistent job queue.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new `pending` job, or fail with [`QueueError::DuplicateJob`].
    async fn enqueue(&self, subject: &Subject, origin: &str) -> Result<JobId, QueueError>;

    /// Atomically move the oldest `pending` job (by `created_at`, then `id`)
    /// to `in-progress` and return it.
    async fn claim_next(&self) -> Result<Option<Job>, QueueError>;

    /// `in-progress -> completed`.
    async fn complete(&self, id: JobId) -> Result<(), QueueError>;

    /// `in-progress -> failed`, recording a non-empty diagnostic.
    async fn fail(&self, id: JobId, error: &str) -> Result<(), QueueError>;

    /// Delete the active job for `subject` if and only if it is still `pending`.
    async fn remove_pending(&self, subject: &Subject) -> Result<JobId, QueueError>;

    /// Reset every `in-progress` job back to `pending`. Returns how many moved.
    async fn recover_orphans(&self) -> Result<u64, QueueError>;

    /// Delete terminal jobs whose `updated_at` is older than `age`.
    async fn purge_terminal_older_than(&self, age: Duration) -> Result<u64, QueueError>;

    async fn get(&self, id: JobId) -> Result<Option<Job>, QueueError>;

    async fn counts(&self) -> Result<StatusCounts, QueueError>;

    /// `pending` and `in-progress` jobs in claim order.
    async fn list_active(&self, limit: u32) -> Result<Vec<Job>, QueueError>;

    /// `completed` and `failed` jobs, most recently updated first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<Job>, QueueError>;
}
