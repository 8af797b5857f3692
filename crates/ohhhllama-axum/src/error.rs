//! Axum-specific error types and mappings.
//!
//! Maps intake and store errors to HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ohhhllama_core::{QueueError, RepositoryError};
use serde::Serialize;
use thiserror::Error;

use crate::intake::IntakeError;

#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Daily request budget used up for this client.
    #[error("Rate limit exceeded: {limit} requests per day")]
    RateLimited { limit: u32 },

    /// Deletion refused (job in progress or absent).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    /// Stable discriminant for client-side handling.
    error: &'static str,
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<u32>,
}

impl HttpError {
    const fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "not_removable"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let (message, remaining) = match &self {
            Self::RateLimited { limit } => (
                format!("Daily limit of {limit} requests reached. Try again tomorrow."),
                Some(0),
            ),
            Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Internal(msg) => (msg.clone(), None),
        };

        if status.is_server_error() {
            tracing::error!(target: "ohhhllama.intake", error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: code,
            message,
            status: status.as_u16(),
            remaining,
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<RepositoryError> for HttpError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Constraint(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<QueueError> for HttpError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Validation(msg) => Self::BadRequest(msg),
            QueueError::NotRemovable(reason) => Self::Conflict(reason.to_string()),
            QueueError::Repository(repo) => repo.into(),
            other @ (QueueError::DuplicateJob { .. } | QueueError::InvalidTransition { .. }) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<IntakeError> for HttpError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Invalid(msg) => Self::BadRequest(msg),
            IntakeError::RateLimited { limit } => Self::RateLimited { limit },
            IntakeError::Queue(e) => e.into(),
            IntakeError::Store(e) => e.into(),
        }
    }
}
