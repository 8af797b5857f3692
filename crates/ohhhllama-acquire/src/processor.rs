//! The queue processor: one scheduled activation drains the queue.
//!
//! Jobs are processed strictly one at a time. Each claimed job is gated on
//! disk usage, then executed with the retry policy; only the processor
//! retries, so attempt counting and backoff live here and nowhere else.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ohhhllama_core::{
    AcquireError, AppConfig, DiskProbe, Job, JobStore, QueueError, RetryPolicy, Sleeper,
};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Runs one job to completion. Implemented by the acquisition pipeline.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job) -> Result<(), AcquireError>;
}

/// Store failures abort the run; job failures never do.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Tallies for one activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub recovered: u64,
    pub completed: u64,
    pub failed: u64,
    pub attempts: u64,
}

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub policy: RetryPolicy,
    pub disk_threshold_percent: f64,
    /// Path whose disk is checked before each job.
    pub disk_path: PathBuf,
    /// Pause between successive jobs.
    pub job_pause: Duration,
}

impl ProcessorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            policy: config.retry_policy(),
            disk_threshold_percent: config.disk_threshold_percent,
            disk_path: config.holding_dir.clone(),
            job_pause: config.job_pause,
        }
    }
}

pub struct QueueProcessor {
    store: Arc<dyn JobStore>,
    executor: Arc<dyn JobExecutor>,
    disk: Arc<dyn DiskProbe>,
    sleeper: Arc<dyn Sleeper>,
    settings: ProcessorSettings,
    cancel: CancellationToken,
}

impl QueueProcessor {
    pub fn new(
        store: Arc<dyn JobStore>,
        executor: Arc<dyn JobExecutor>,
        disk: Arc<dyn DiskProbe>,
        sleeper: Arc<dyn Sleeper>,
        settings: ProcessorSettings,
    ) -> Self {
        Self {
            store,
            executor,
            disk,
            sleeper,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop claiming new jobs once `token` is cancelled. A job already
    /// claimed runs to its end.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// One scheduled activation: recover orphans, then drain the queue.
    pub async fn run_once(&self) -> Result<RunSummary, ProcessorError> {
        let mut summary = RunSummary {
            recovered: self.store.recover_orphans().await?,
            ..RunSummary::default()
        };
        if summary.recovered > 0 {
            tracing::warn!(target: "ohhhllama.processor", count = summary.recovered, "reset orphaned in-progress jobs");
        }

        let mut first = true;
        while !self.cancel.is_cancelled() {
            // The pause comes before the claim so the next job stays pending
            // while we wait.
            if !first {
                if self.store.counts().await?.pending == 0 {
                    break;
                }
                self.sleeper.sleep(self.settings.job_pause).await;
                if self.cancel.is_cancelled() {
                    break;
                }
            }
            first = false;

            let Some(job) = self.store.claim_next().await? else {
                break;
            };

            tracing::info!(target: "ohhhllama.processor", job_id = %job.id, kind = %job.kind(), subject = %job.subject, "claimed job");
            let (result, attempts) = self.process(&job).await;
            summary.attempts += u64::from(attempts);

            match result {
                Ok(()) => {
                    self.store.complete(job.id).await?;
                    summary.completed += 1;
                    tracing::info!(target: "ohhhllama.processor", job_id = %job.id, attempts, "job completed");
                }
                Err(e) => {
                    let message = if attempts > 1 {
                        format!("{e} (gave up after {attempts} attempts)")
                    } else {
                        e.to_string()
                    };
                    self.store.fail(job.id, &message).await?;
                    summary.failed += 1;
                    tracing::error!(target: "ohhhllama.processor", job_id = %job.id, category = e.category(), error = %message, "job failed");
                }
            }
        }

        if self.cancel.is_cancelled() {
            tracing::info!(target: "ohhhllama.processor", "cancelled; remaining jobs stay pending");
        }
        tracing::info!(
            target: "ohhhllama.processor",
            recovered = summary.recovered,
            completed = summary.completed,
            failed = summary.failed,
            attempts = summary.attempts,
            "run finished"
        );
        Ok(summary)
    }

    /// Gate on disk usage, then run the job with retries. Returns the outcome
    /// and the number of executor attempts made.
    async fn process(&self, job: &Job) -> (Result<(), AcquireError>, u32) {
        if let Err(e) = self.check_capacity() {
            return (Err(e), 0);
        }

        let policy = &self.settings.policy;
        let mut attempt: u32 = 1;
        loop {
            let delay = policy.delay_before(attempt);
            if !delay.is_zero() {
                tracing::info!(target: "ohhhllama.processor", job_id = %job.id, attempt, delay_secs = delay.as_secs(), "waiting before retry");
                self.sleeper.sleep(delay).await;
            }

            match self.executor.execute(job).await {
                Ok(()) => return (Ok(()), attempt),
                Err(e) if !e.is_recoverable() => return (Err(e), attempt),
                Err(e) if policy.should_retry(attempt) => {
                    tracing::warn!(target: "ohhhllama.processor", job_id = %job.id, attempt, max = policy.max_attempts, error = %e, "attempt failed");
                    attempt += 1;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }

    fn check_capacity(&self) -> Result<(), AcquireError> {
        let threshold = self.settings.disk_threshold_percent;
        match self.disk.usage_percent(&self.settings.disk_path) {
            Ok(usage) if usage > threshold => Err(AcquireError::CapacityExceeded {
                usage_percent: usage,
                threshold_percent: threshold,
            }),
            Ok(usage) => {
                tracing::debug!(target: "ohhhllama.processor", usage, threshold, "disk check passed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(target: "ohhhllama.processor", error = %e, "disk usage unknown; proceeding");
                Ok(())
            }
        }
    }
}
