//! Request-time intake: installed check, rate limit, enqueue.
//!
//! The order matters. The limiter counts every request that reaches it,
//! including ones that turn out to be duplicates, so only a model the
//! backend already has skips the count.

use std::sync::Arc;
use std::time::Duration;

use ohhhllama_core::{
    InferenceBackend, JobId, QueueError, RateDecision, RepositoryError, Stores, Subject,
    ports::is_installed,
};
use thiserror::Error;

/// Upper bound on the backend lookup done while a client waits.
pub const INSTALLED_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// What happened to an intake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// The backend already has the model; nothing was queued or counted.
    AlreadyInstalled,
    Queued { id: JobId, rate: RateDecision },
    /// An active job for the same subject exists.
    AlreadyQueued { id: JobId, rate: RateDecision },
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("rate limit exceeded: {limit} requests per day")]
    RateLimited { limit: u32 },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Intake entry point shared by the HTTP handlers.
pub struct IntakeService {
    stores: Stores,
    backend: Option<Arc<dyn InferenceBackend>>,
    installed_timeout: Duration,
}

impl IntakeService {
    pub fn new(stores: Stores, backend: Option<Arc<dyn InferenceBackend>>) -> Self {
        Self {
            stores,
            backend,
            installed_timeout: INSTALLED_CHECK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_installed_timeout(mut self, timeout: Duration) -> Self {
        self.installed_timeout = timeout;
        self
    }

    pub fn rate_limit(&self) -> u32 {
        self.stores.rate_limiter.limit()
    }

    pub async fn submit(&self, subject: &Subject, origin: &str) -> Result<IntakeOutcome, IntakeError> {
        subject.validate().map_err(IntakeError::Invalid)?;

        if let Subject::BinaryPull { name } = subject {
            if self.already_installed(name).await {
                tracing::info!(target: "ohhhllama.intake", model = %name, origin = %origin, "Model already installed");
                return Ok(IntakeOutcome::AlreadyInstalled);
            }
        }

        let rate = self.stores.rate_limiter.check_and_increment(origin).await?;
        if !rate.allowed {
            tracing::warn!(target: "ohhhllama.intake", origin = %origin, limit = rate.limit, "Rate limit exceeded");
            return Err(IntakeError::RateLimited { limit: rate.limit });
        }

        match self.stores.jobs.enqueue(subject, origin).await {
            Ok(id) => {
                tracing::info!(
                    target: "ohhhllama.intake",
                    job_id = %id,
                    kind = %subject.kind(),
                    subject = %subject,
                    origin = %origin,
                    remaining = rate.remaining,
                    "Queued"
                );
                Ok(IntakeOutcome::Queued { id, rate })
            }
            Err(QueueError::DuplicateJob { existing, .. }) => {
                tracing::info!(target: "ohhhllama.intake", job_id = %existing, subject = %subject, "Already queued");
                Ok(IntakeOutcome::AlreadyQueued { id: existing, rate })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lookup failures and timeouts count as "not installed".
    async fn already_installed(&self, name: &str) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };
        match tokio::time::timeout(self.installed_timeout, backend.list_installed()).await {
            Ok(Ok(installed)) => is_installed(&installed, name),
            Ok(Err(e)) => {
                tracing::debug!(target: "ohhhllama.intake", error = %e, "Installed check failed");
                false
            }
            Err(_) => {
                tracing::debug!(target: "ohhhllama.intake", "Installed check timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use ohhhllama_core::{JobStatus, JobStore, RateLimiter, RepoDescriptor};
    use ohhhllama_db::TestDb;

    async fn service(limit: u32, backend: Option<FakeBackend>) -> (TestDb, IntakeService) {
        let db = TestDb::new().await.unwrap();
        let backend = backend.map(|b| Arc::new(b) as Arc<dyn InferenceBackend>);
        let intake = IntakeService::new(db.stores(limit), backend);
        (db, intake)
    }

    fn repo_subject() -> Subject {
        Subject::RepositoryAcquire(
            RepoDescriptor::new("org/model-GGUF").with_quant(ohhhllama_core::Quantization::Q4KM),
        )
    }

    #[tokio::test]
    async fn test_duplicate_submission_is_already_queued() {
        let (db, intake) = service(5, None).await;

        let first = intake.submit(&repo_subject(), "10.0.0.1").await.unwrap();
        let second = intake.submit(&repo_subject(), "10.0.0.1").await.unwrap();

        let IntakeOutcome::Queued { id, .. } = first else {
            panic!("expected queued, got {first:?}");
        };
        assert!(matches!(second, IntakeOutcome::AlreadyQueued { id: existing, .. } if existing == id));
        assert_eq!(db.job_store().counts().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn test_duplicates_still_count_against_the_limit() {
        let (_db, intake) = service(2, None).await;

        intake.submit(&repo_subject(), "10.0.0.1").await.unwrap();
        let dup = intake.submit(&repo_subject(), "10.0.0.1").await.unwrap();
        let IntakeOutcome::AlreadyQueued { rate, .. } = dup else {
            panic!("expected already queued");
        };
        assert_eq!(rate.remaining, 0);

        let err = intake
            .submit(&Subject::binary("phi3"), "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::RateLimited { limit: 2 }));
    }

    #[tokio::test]
    async fn test_rate_limited_request_creates_no_job() {
        let (db, intake) = service(1, None).await;

        intake.submit(&Subject::binary("llama3"), "1.2.3.4").await.unwrap();
        let err = intake.submit(&Subject::binary("mistral"), "1.2.3.4").await.unwrap_err();

        assert!(matches!(err, IntakeError::RateLimited { .. }));
        let counts = db.job_store().counts().await.unwrap();
        assert_eq!(counts.pending, 1);

        // Other origins have their own budget.
        let other = intake.submit(&Subject::binary("mistral"), "5.6.7.8").await.unwrap();
        assert!(matches!(other, IntakeOutcome::Queued { .. }));
    }

    #[tokio::test]
    async fn test_installed_model_skips_queue_and_limiter() {
        let backend = FakeBackend::with_installed(&["llama3:latest"]);
        let (db, intake) = service(1, Some(backend)).await;

        for _ in 0..3 {
            let outcome = intake.submit(&Subject::binary("llama3"), "1.2.3.4").await.unwrap();
            assert_eq!(outcome, IntakeOutcome::AlreadyInstalled);
        }
        assert_eq!(db.job_store().counts().await.unwrap().pending, 0);

        let outcome = intake.submit(&Subject::binary("phi3"), "1.2.3.4").await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Queued { .. }));
    }

    #[tokio::test]
    async fn test_other_tag_of_installed_model_is_queued() {
        let backend = FakeBackend::with_installed(&["llama3:8b"]);
        let (db, intake) = service(5, Some(backend)).await;

        let outcome = intake.submit(&Subject::binary("llama3:70b"), "1.2.3.4").await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Queued { .. }));
        assert_eq!(db.job_store().counts().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend_counts_as_not_installed() {
        let (db, intake) = service(5, Some(FakeBackend::unreachable())).await;

        let outcome = intake.submit(&Subject::binary("llama3"), "1.2.3.4").await.unwrap();
        let IntakeOutcome::Queued { id, .. } = outcome else {
            panic!("expected queued");
        };
        let job = db.job_store().get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.origin, "1.2.3.4");
    }

    #[tokio::test]
    async fn test_slow_backend_is_bounded_by_timeout() {
        let backend = FakeBackend::with_installed(&["llama3"]).with_delay(Duration::from_secs(60));
        let (_db, intake) = service(5, Some(backend)).await;
        let intake = intake.with_installed_timeout(Duration::from_millis(20));

        let outcome = intake.submit(&Subject::binary("llama3"), "1.2.3.4").await.unwrap();
        assert!(matches!(outcome, IntakeOutcome::Queued { .. }));
    }

    #[tokio::test]
    async fn test_invalid_subject_is_rejected_before_counting() {
        let (db, intake) = service(1, None).await;

        let err = intake.submit(&Subject::binary("  "), "1.2.3.4").await.unwrap_err();
        assert!(matches!(err, IntakeError::Invalid(_)));

        let decision = db.rate_limiter(1).check_and_increment("1.2.3.4").await.unwrap();
        assert!(decision.allowed);
    }
}
