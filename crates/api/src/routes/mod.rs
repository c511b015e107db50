pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                 live exercise session (WebSocket)
///
/// /feedback           rule feedback for one recorded cycle (POST)
/// /exercises          exercise profile catalogue (GET)
/// /chat               trainer Q&A (POST)
/// /analyze-image      form check of one still frame (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/feedback", post(handlers::feedback::cycle_feedback))
        .route("/exercises", get(handlers::exercises::list_exercises))
        .route("/chat", post(handlers::chat::ask_trainer))
        .route("/analyze-image", post(handlers::frame_check::analyze_image))
}
