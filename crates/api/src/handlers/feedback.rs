//! Rule feedback for a single recorded cycle.
//!
//! Stateless counterpart of the live session: the client posts the frames
//! of one rep and gets the same digest and verdict the session would produce.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::{Deserialize, Serialize};

use repcoach_core::cycle::{analyze_cycle, CycleDigest, CycleSample, MAX_CYCLE_FRAMES};
use repcoach_core::feedback::{evaluate, FeedbackPolicy, FormFeedback};
use repcoach_core::profile::ExerciseProfile;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct CycleFeedbackRequest {
    pub cycle_data: Vec<CycleSample>,
    /// Profile whose policy applies. Defaults to squat.
    #[serde(default)]
    pub exercise: Option<String>,
    /// Overrides the profile's policy; missing fields take squat defaults.
    #[serde(default)]
    pub policy: Option<FeedbackPolicy>,
}

#[derive(Debug, Serialize)]
pub struct CycleFeedbackResponse {
    pub feedback: String,
    #[serde(flatten)]
    pub result: FormFeedback,
    /// `null` when the cycle was too short to analyse.
    pub analysis: Option<CycleDigest>,
}

/// POST /api/v1/feedback
///
/// Too-short cycles are a valid result (insufficient-data verdict with no
/// analysis), not an error.
pub async fn cycle_feedback(
    payload: Result<Json<CycleFeedbackRequest>, JsonRejection>,
) -> AppResult<Json<CycleFeedbackResponse>> {
    let Json(input) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let profile = match input.exercise.as_deref() {
        Some(name) => name.parse::<ExerciseProfile>()?,
        None => ExerciseProfile::Squat,
    };
    let policy = input.policy.unwrap_or_else(|| profile.feedback_policy());
    policy.validate()?;

    if input.cycle_data.len() > MAX_CYCLE_FRAMES {
        return Err(AppError::BadRequest(format!(
            "cycle_data holds {} frames, at most {MAX_CYCLE_FRAMES} allowed",
            input.cycle_data.len()
        )));
    }

    let (result, analysis) = match analyze_cycle(&input.cycle_data) {
        Ok(digest) => (evaluate(&digest, &policy), Some(digest)),
        Err(short) => {
            tracing::debug!(frames = short.frames, required = short.required, "Cycle too short");
            (FormFeedback::InsufficientData, None)
        }
    };

    tracing::debug!(
        exercise = %profile,
        frames = input.cycle_data.len(),
        result = ?result,
        "Cycle feedback computed",
    );

    Ok(Json(CycleFeedbackResponse {
        feedback: result.message(profile),
        result,
        analysis,
    }))
}
