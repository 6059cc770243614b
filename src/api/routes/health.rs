use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ai_available: bool,
    pub vector_db_available: bool,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub vector_db: String,
}

/// Liveness. Never touches a backend, so it stays 200 while dependencies
/// flap.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        ai_available: state.assistant.is_some(),
        vector_db_available: state.vector_store.is_some(),
    })
}

/// Readiness. A configured vector index must answer a stats call; one that
/// was never configured reports "disabled" and does not block readiness.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let vector_status = match &state.vector_store {
        Some(store) => {
            if store.stats().await.is_ok() {
                "connected"
            } else {
                "disconnected"
            }
        }
        None => "disabled",
    };

    let is_healthy = vector_status != "disconnected";

    let response = ReadinessResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.into(),
        vector_db: vector_status.into(),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
