// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Write-read probe against the data directory.
    pub data_dir: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Connectivity check used by the front-end.
#[utoipa::path(
    get,
    path = "/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Plain-text pong", body = String)
    )
)]
pub async fn ping() -> &'static str {
    "Pong!"
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 200 only if the data directory is writable.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let data_ok = match state.store.health_check() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Data directory health check failed");
            false
        }
    };

    let response = ReadyResponse {
        status: if data_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            data_dir: if data_ok { "ok" } else { "unavailable" }.to_string(),
        },
    };

    let status = if data_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;

    #[tokio::test]
    async fn ping_pongs() {
        assert_eq!(ping().await, "Pong!");
    }

    #[tokio::test]
    async fn ready_with_writable_data_dir() {
        let (state, _temp) = test_state();
        let (status, Json(body)) = readiness(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.checks.data_dir, "ok");
    }
}
