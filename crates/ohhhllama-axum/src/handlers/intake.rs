//! Intake handlers: the compatible pull endpoint and typed enqueue.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ohhhllama_core::Subject;

use super::ClientOrigin;
use crate::dto::{InstalledResponse, PullRequest, QueueStatus, QueuedResponse};
use crate::error::HttpError;
use crate::intake::IntakeOutcome;
use crate::state::AppState;

/// `POST /api/pull`: queue a backend-native model by name.
pub async fn pull(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Json(req): Json<PullRequest>,
) -> Result<Response, HttpError> {
    let name = req
        .model_name()
        .ok_or_else(|| HttpError::BadRequest("Model name required".to_string()))?;
    submit(&state, &Subject::binary(name), &origin).await
}

/// `POST /api/queue`: queue any typed subject.
pub async fn enqueue(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Json(subject): Json<Subject>,
) -> Result<Response, HttpError> {
    submit(&state, &subject, &origin).await
}

async fn submit(state: &AppState, subject: &Subject, origin: &str) -> Result<Response, HttpError> {
    let response = match state.intake.submit(subject, origin).await? {
        IntakeOutcome::AlreadyInstalled => (
            StatusCode::OK,
            Json(InstalledResponse {
                status: "success".to_string(),
            }),
        )
            .into_response(),
        IntakeOutcome::Queued { id, rate } => (
            StatusCode::ACCEPTED,
            Json(QueuedResponse {
                status: QueueStatus::Queued,
                message: format!("{subject} added to download queue"),
                queue_id: id,
                rate_limit: rate.into(),
            }),
        )
            .into_response(),
        IntakeOutcome::AlreadyQueued { id, rate } => (
            StatusCode::ACCEPTED,
            Json(QueuedResponse {
                status: QueueStatus::AlreadyQueued,
                message: format!("{subject} is already in the download queue"),
                queue_id: id,
                rate_limit: rate.into(),
            }),
        )
            .into_response(),
    };
    Ok(response)
}
