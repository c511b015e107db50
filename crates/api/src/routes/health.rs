use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether an LLM client is configured.
    pub coach_enabled: bool,
    /// Whether camera frames can be turned into landmarks server-side.
    pub pose_service_enabled: bool,
    /// Open exercise sessions.
    pub active_sessions: usize,
    /// Sessions with a recorded set in progress.
    pub recording_sessions: usize,
}

/// GET /health -- returns service status and session count.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        coach_enabled: state.coach.is_some(),
        pose_service_enabled: state.pose.is_some(),
        active_sessions: state.ws_manager.connection_count().await,
        recording_sessions: state.ws_manager.recording_count().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
