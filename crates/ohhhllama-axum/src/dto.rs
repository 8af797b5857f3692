//! Request and response bodies.

use ohhhllama_core::{Job, JobId, RateDecision, StatusCounts};
use serde::{Deserialize, Serialize};

/// Body of the inference-API compatible `POST /api/pull`.
#[derive(Debug, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl PullRequest {
    /// `name` wins over `model`; blank values count as missing.
    pub fn model_name(&self) -> Option<&str> {
        [self.name.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub limit: u32,
}

impl From<RateDecision> for RateLimitInfo {
    fn from(decision: RateDecision) -> Self {
        Self {
            remaining: decision.remaining,
            limit: decision.limit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Queued,
    AlreadyQueued,
}

/// 202 reply to an intake request.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub status: QueueStatus,
    pub message: String,
    pub queue_id: JobId,
    pub rate_limit: RateLimitInfo,
}

/// 200 reply when the backend already has the model.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstalledResponse {
    pub status: String,
}

/// `GET /api/queue`.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub counts: StatusCounts,
    /// Pending and in-progress jobs in claim order.
    pub queue: Vec<Job>,
    /// Most recently finished jobs.
    pub recent: Vec<Job>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub status: String,
    pub queue_id: JobId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    pub const fn ok() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiskCheckResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_percent: Option<f64>,
    pub threshold_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl DiskCheckResult {
    /// The probe produced no reading.
    pub fn unavailable(threshold_percent: f64, detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            usage_percent: None,
            threshold_percent,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub store: CheckResult,
    pub backend: CheckResult,
    pub disk: DiskCheckResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HealthChecks,
}

impl HealthChecks {
    /// Store down is fatal; anything else failing only degrades.
    pub const fn overall(&self) -> HealthStatus {
        if !self.store.ok {
            HealthStatus::Unhealthy
        } else if !self.backend.ok || !self.disk.ok {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
