//! Trainer Q&A over the coaching LLM.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use repcoach_coach::chat::trainer_reply;
use repcoach_coach::fallback::CHAT_UNAVAILABLE;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Longest accepted question, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/v1/chat
///
/// LLM trouble is answered with an apology rather than an error status.
pub async fn ask_trainer(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let message = input.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let Some(client) = state.coach.as_deref() else {
        return Ok(Json(ChatResponse {
            response: CHAT_UNAVAILABLE.to_string(),
        }));
    };

    let response = match trainer_reply(client, message, state.config.coach.timeout()).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(error = %e, "Trainer reply failed");
            CHAT_UNAVAILABLE.to_string()
        }
    };

    Ok(Json(ChatResponse { response }))
}
