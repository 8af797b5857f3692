//! Per-client daily request limiter port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RepositoryError;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDecision {
    pub allowed: bool,
    /// Requests left today after this one. Zero when denied.
    pub remaining: u32,
    pub limit: u32,
}

/// Counts requests per (origin, calendar day).
///
/// Every call that is allowed is counted, whatever happens to the request
/// afterwards. Callers that only want accepted requests counted must call
/// the limiter last.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check_and_increment(&self, origin: &str) -> Result<RateDecision, RepositoryError>;

    /// Administrative reset of today's counter for `origin`.
    async fn reset(&self, origin: &str) -> Result<u64, RepositoryError>;

    fn limit(&self) -> u32;
}
