//! Queue status and removal.

use axum::Json;
use axum::extract::State;
use ohhhllama_core::Subject;

use crate::dto::{QueueSnapshot, RemovedResponse};
use crate::error::HttpError;
use crate::state::AppState;

pub const ACTIVE_LIMIT: u32 = 50;
pub const RECENT_LIMIT: u32 = 10;

/// `GET /api/queue`.
pub async fn status(State(state): State<AppState>) -> Result<Json<QueueSnapshot>, HttpError> {
    let jobs = &state.stores.jobs;
    let snapshot = QueueSnapshot {
        counts: jobs.counts().await?,
        queue: jobs.list_active(ACTIVE_LIMIT).await?,
        recent: jobs.list_recent(RECENT_LIMIT).await?,
    };

    tracing::debug!(
        target: "ohhhllama.queue",
        pending = snapshot.counts.pending,
        in_progress = snapshot.counts.in_progress,
        "Queue snapshot returned"
    );
    Ok(Json(snapshot))
}

/// `DELETE /api/queue`: drop a job that has not started yet.
pub async fn remove(
    State(state): State<AppState>,
    Json(subject): Json<Subject>,
) -> Result<Json<RemovedResponse>, HttpError> {
    let id = state.stores.jobs.remove_pending(&subject).await?;
    tracing::info!(target: "ohhhllama.queue", job_id = %id, subject = %subject, "Removed pending job");
    Ok(Json(RemovedResponse {
        status: "removed".to_string(),
        queue_id: id,
    }))
}
