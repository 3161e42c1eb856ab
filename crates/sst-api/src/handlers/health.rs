//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::producer::ProducerState;
use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub producer: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    pub state: ProducerState,
    pub frames_processed: u64,
}

/// Readiness check endpoint (readiness probe).
/// Ready while the frame producer is running.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let producer_state = state.producer.state();
    let running = producer_state == ProducerState::Running;

    let response = ReadinessResponse {
        status: if running { "ready" } else { "not_ready" }.to_string(),
        checks: ReadinessChecks {
            producer: CheckStatus {
                status: if running { "ok" } else { "error" }.to_string(),
                state: producer_state,
                frames_processed: state.producer.frames(),
            },
        },
    };

    if running {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
