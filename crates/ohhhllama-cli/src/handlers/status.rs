//! `ohhhllama status`.

use ohhhllama_core::{Job, StatusCounts};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{print_counts, print_job_table};

pub const ACTIVE_LIMIT: u32 = 50;
pub const RECENT_LIMIT: u32 = 10;

pub struct QueueStatus {
    pub counts: StatusCounts,
    pub active: Vec<Job>,
    pub recent: Vec<Job>,
}

pub async fn execute(ctx: &CliContext) -> Result<QueueStatus, CliError> {
    let jobs = &ctx.stores.jobs;
    let status = QueueStatus {
        counts: jobs.counts().await?,
        active: jobs.list_active(ACTIVE_LIMIT).await?,
        recent: jobs.list_recent(RECENT_LIMIT).await?,
    };

    print_counts(&status.counts);
    print_job_table("Queue", &status.active);
    print_job_table("Recent", &status.recent);
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;
    use ohhhllama_core::{JobStatus, JobStore, Subject};

    #[tokio::test]
    async fn test_status_splits_active_and_recent() {
        let (db, ctx) = context().await;
        let store = db.job_store();
        store.enqueue(&Subject::binary("a"), "o").await.unwrap();
        store.enqueue(&Subject::binary("b"), "o").await.unwrap();
        let claimed = store.claim_next().await.unwrap().unwrap();
        store.complete(claimed.id).await.unwrap();

        let status = execute(&ctx).await.unwrap();
        assert_eq!(status.counts.completed, 1);
        assert_eq!(status.active.len(), 1);
        assert_eq!(status.active[0].subject, Subject::binary("b"));
        assert_eq!(status.recent[0].status, JobStatus::Completed);
    }
}
