//! `SQLite` implementation of the [`JobStore`] port.
//!
//! Every mutation runs inside a transaction whose first statement is a write,
//! so the check-then-act step (duplicate check + insert, select oldest +
//! mark in-progress) holds the write lock for its whole duration.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;

use ohhhllama_core::{
    Job, JobId, JobStatus, JobStore, NotRemovableReason, QueueError, RepositoryError,
    StatusCounts, Subject,
};

use super::row_mappers::{JOB_SELECT_COLUMNS, format_datetime, row_to_job};

/// Fallback diagnostic when a caller fails a job with an empty message.
const EMPTY_ERROR_PLACEHOLDER: &str = "failed without diagnostic output";

fn storage(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Persists the job queue in the `jobs` table.
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool (for testing only).
    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Shared transition for `complete` and `fail`.
    async fn finish(
        &self,
        id: JobId,
        status: JobStatus,
        error: Option<&str>,
    ) -> Result<(), QueueError> {
        let now = format_datetime(Utc::now());
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let result = sqlx::query(
            r#"
            UPDATE jobs SET status = ?, error = ?, updated_at = ?
            WHERE id = ? AND status = 'in-progress'
            "#,
        )
        .bind(status.as_str())
        .bind(error)
        .bind(&now)
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            let actual: Option<String> = sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage)?;
            tx.rollback().await.map_err(storage)?;
            return Err(QueueError::InvalidTransition {
                id,
                expected: JobStatus::InProgress,
                actual: actual.unwrap_or_else(|| "missing".to_string()),
            });
        }

        tx.commit().await.map_err(storage)?;
        tracing::info!(target: "ohhhllama.queue", job_id = %id, status = %status, "job finished");
        Ok(())
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn enqueue(&self, subject: &Subject, origin: &str) -> Result<JobId, QueueError> {
        subject.validate().map_err(QueueError::Validation)?;

        let subject_json = serde_json::to_string(subject)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let dedup_key = subject.dedup_key();
        let now = format_datetime(Utc::now());

        let mut tx = self.pool.begin().await.map_err(storage)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO jobs (kind, subject, dedup_key, origin, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(subject.kind().as_str())
        .bind(&subject_json)
        .bind(&dedup_key)
        .bind(origin)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(result) => {
                tx.commit().await.map_err(storage)?;
                let id = JobId(result.last_insert_rowid());
                tracing::info!(
                    target: "ohhhllama.queue",
                    job_id = %id,
                    kind = %subject.kind(),
                    subject = %subject,
                    origin,
                    "job enqueued"
                );
                Ok(id)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                let existing: Option<i64> = sqlx::query_scalar(
                    r#"
                    SELECT id FROM jobs
                    WHERE dedup_key = ? AND status IN ('pending', 'in-progress')
                    "#,
                )
                .bind(&dedup_key)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage)?;
                tx.rollback().await.map_err(storage)?;

                let existing = existing.map(JobId).ok_or_else(|| {
                    RepositoryError::Constraint(format!(
                        "unique violation on '{dedup_key}' without an active job"
                    ))
                })?;
                tracing::debug!(target: "ohhhllama.queue", %existing, dedup_key = %dedup_key, "duplicate enqueue");
                Err(QueueError::DuplicateJob {
                    existing,
                    dedup_key,
                })
            }
            Err(e) => Err(storage(e).into()),
        }
    }

    async fn claim_next(&self) -> Result<Option<Job>, QueueError> {
        let now = format_datetime(Utc::now());
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let sql = format!(
            r#"
            UPDATE jobs SET status = 'in-progress', updated_at = ?
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'pending'
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            AND status = 'pending'
            RETURNING {JOB_SELECT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let job = row.as_ref().map(row_to_job).transpose()?;
        if let Some(job) = &job {
            tracing::info!(target: "ohhhllama.queue", job_id = %job.id, subject = %job.subject, "job claimed");
        }
        Ok(job)
    }

    async fn complete(&self, id: JobId) -> Result<(), QueueError> {
        self.finish(id, JobStatus::Completed, None).await
    }

    async fn fail(&self, id: JobId, error: &str) -> Result<(), QueueError> {
        let error = match error.trim() {
            "" => EMPTY_ERROR_PLACEHOLDER,
            trimmed => trimmed,
        };
        self.finish(id, JobStatus::Failed, Some(error)).await
    }

    async fn remove_pending(&self, subject: &Subject) -> Result<JobId, QueueError> {
        let dedup_key = subject.dedup_key();
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let deleted: Option<i64> = sqlx::query_scalar(
            r#"
            DELETE FROM jobs WHERE dedup_key = ? AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(&dedup_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        if let Some(id) = deleted {
            tx.commit().await.map_err(storage)?;
            tracing::info!(target: "ohhhllama.queue", job_id = id, subject = %subject, "pending job removed");
            return Ok(JobId(id));
        }

        let in_progress: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM jobs WHERE dedup_key = ? AND status = 'in-progress'",
        )
        .bind(&dedup_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;
        tx.rollback().await.map_err(storage)?;

        let reason = in_progress.map_or(NotRemovableReason::Absent, |id| {
            NotRemovableReason::InProgress(JobId(id))
        });
        Err(QueueError::NotRemovable(reason))
    }

    async fn recover_orphans(&self) -> Result<u64, QueueError> {
        let now = format_datetime(Utc::now());
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let result = sqlx::query(
            "UPDATE jobs SET status = 'pending', updated_at = ? WHERE status = 'in-progress'",
        )
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let recovered = result.rows_affected();
        if recovered > 0 {
            tracing::warn!(target: "ohhhllama.queue", recovered, "reset orphaned in-progress jobs to pending");
        }
        Ok(recovered)
    }

    async fn purge_terminal_older_than(&self, age: Duration) -> Result<u64, QueueError> {
        let age = chrono::Duration::from_std(age)
            .map_err(|e| QueueError::Validation(format!("purge age out of range: {e}")))?;
        let cutoff = format_datetime(Utc::now() - age);
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE status IN ('completed', 'failed') AND updated_at < ?
            "#,
        )
        .bind(&cutoff)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let purged = result.rows_affected();
        tracing::info!(target: "ohhhllama.queue", purged, %cutoff, "purged terminal jobs");
        Ok(purged)
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, QueueError> {
        let sql = format!("SELECT {JOB_SELECT_COLUMNS} FROM jobs WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.as_ref().map(row_to_job).transpose()?)
    }

    async fn counts(&self) -> Result<StatusCounts, QueueError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            let status: JobStatus = status.parse().map_err(RepositoryError::Serialization)?;
            counts.add(status, u64::try_from(n).unwrap_or_default());
        }
        Ok(counts)
    }

    async fn list_active(&self, limit: u32) -> Result<Vec<Job>, QueueError> {
        let sql = format!(
            r#"
            SELECT {JOB_SELECT_COLUMNS} FROM jobs
            WHERE status IN ('pending', 'in-progress')
            ORDER BY created_at ASC, id ASC
            LIMIT ?
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.iter().map(row_to_job).collect::<Result<Vec<_>, _>>()?)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Job>, QueueError> {
        let sql = format!(
            r#"
            SELECT {JOB_SELECT_COLUMNS} FROM jobs
            WHERE status IN ('completed', 'failed')
            ORDER BY updated_at DESC, id DESC
            LIMIT ?
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(rows.iter().map(row_to_job).collect::<Result<Vec<_>, _>>()?)
    }
}
