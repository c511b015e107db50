//! Form check of a single still frame over the coaching LLM.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use repcoach_coach::frame_check::{frame_feedback, FrameCheck};
use repcoach_core::profile::ExerciseProfile;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::protocol::to_data_url;

#[derive(Debug, Deserialize)]
pub struct FrameCheckRequest {
    /// Base64 JPEG or a data URL.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub rep_count: u32,
    /// Defaults to squat.
    #[serde(default)]
    pub exercise_type: Option<String>,
    /// Seconds held so far, for timed exercises.
    #[serde(default)]
    pub hold_time: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct FrameCheckResponse {
    pub feedback: String,
}

/// POST /api/v1/analyze-image
///
/// LLM trouble, or no LLM at all, is answered with a fixed line rather than
/// an error status.
pub async fn analyze_image(
    State(state): State<AppState>,
    payload: Result<Json<FrameCheckRequest>, JsonRejection>,
) -> AppResult<Json<FrameCheckResponse>> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let profile = match input.exercise_type.as_deref() {
        Some(name) => name.parse::<ExerciseProfile>()?,
        None => ExerciseProfile::Squat,
    };
    if input.image.trim().is_empty() {
        return Err(AppError::BadRequest("Image must not be empty".into()));
    }

    let check = FrameCheck {
        profile,
        rep_count: input.rep_count,
        hold_secs: input.hold_time,
        image: to_data_url(&input.image),
    };
    let coach = &state.config.coach;
    let feedback = frame_feedback(
        state.coach.as_deref(),
        &check,
        coach.timeout(),
        coach.char_limit,
    )
    .await;

    Ok(Json(FrameCheckResponse { feedback }))
}
