//! Tri-state health summary.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{CheckResult, DiskCheckResult, HealthChecks, HealthResponse, HealthStatus};
use crate::state::AppState;

/// `GET /api/health`. 503 only when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (store, backend, disk) =
        tokio::join!(check_store(&state), check_backend(&state), check_disk(&state));
    let checks = HealthChecks {
        store,
        backend,
        disk,
    };
    let status = checks.overall();

    if status != HealthStatus::Healthy {
        tracing::warn!(target: "ohhhllama.intake", status = ?status, "Health check not healthy");
    }

    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(HealthResponse { status, checks }))
}

async fn check_store(state: &AppState) -> CheckResult {
    match tokio::time::timeout(state.probe_timeout, state.stores.jobs.counts()).await {
        Ok(Ok(_)) => CheckResult::ok(),
        Ok(Err(e)) => CheckResult::failed(e.to_string()),
        Err(_) => CheckResult::failed("store check timed out"),
    }
}

async fn check_backend(state: &AppState) -> CheckResult {
    match tokio::time::timeout(state.probe_timeout, state.backend.ping()).await {
        Ok(Ok(())) => CheckResult::ok(),
        Ok(Err(e)) => CheckResult::failed(e.to_string()),
        Err(_) => CheckResult::failed("backend check timed out"),
    }
}

/// Disk statistics come from a blocking syscall, so the probe runs on the
/// blocking pool under the same timeout as the other checks.
async fn check_disk(state: &AppState) -> DiskCheckResult {
    let threshold = state.disk_check.threshold_percent;
    let disk = Arc::clone(&state.disk);
    let path = state.disk_check.path.clone();
    let probe = tokio::task::spawn_blocking(move || disk.usage_percent(&path));

    let usage = match tokio::time::timeout(state.probe_timeout, probe).await {
        Ok(Ok(Ok(usage))) => usage,
        Ok(Ok(Err(e))) => return DiskCheckResult::unavailable(threshold, e.to_string()),
        Ok(Err(e)) => {
            return DiskCheckResult::unavailable(threshold, format!("disk check failed: {e}"));
        }
        Err(_) => return DiskCheckResult::unavailable(threshold, "disk check timed out"),
    };
    DiskCheckResult {
        ok: usage <= threshold,
        usage_percent: Some(usage),
        threshold_percent: threshold,
        detail: (usage > threshold).then(|| format!("disk usage {usage:.1}% exceeds {threshold:.0}%")),
    }
}
