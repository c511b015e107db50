use axum::Json;
use serde::Serialize;

use repcoach_core::feedback::{AngleBand, FeedbackPolicy};
use repcoach_core::metrics::AngleKind;
use repcoach_core::profile::ExerciseProfile;
use repcoach_core::rep_counter::RepThresholds;

use crate::response::DataResponse;

/// One entry of the exercise catalogue.
#[derive(Debug, Serialize)]
pub struct ExerciseInfo {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub timed: bool,
    pub primary_angle: AngleKind,
    pub rep_thresholds: Option<RepThresholds>,
    pub feedback_policy: FeedbackPolicy,
    pub hold_band: Option<AngleBand>,
}

impl From<ExerciseProfile> for ExerciseInfo {
    fn from(profile: ExerciseProfile) -> Self {
        Self {
            slug: profile.slug(),
            display_name: profile.display_name(),
            timed: profile.is_timed(),
            primary_angle: profile.primary_angle(),
            rep_thresholds: profile.rep_thresholds(),
            feedback_policy: profile.feedback_policy(),
            hold_band: profile.hold_band(),
        }
    }
}

/// GET /api/v1/exercises
pub async fn list_exercises() -> Json<DataResponse<Vec<ExerciseInfo>>> {
    let data = ExerciseProfile::ALL.into_iter().map(ExerciseInfo::from).collect();
    Json(DataResponse { data })
}
