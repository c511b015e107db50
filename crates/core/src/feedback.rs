//! Rule-based form feedback over a cycle digest.
//!
//! At most one problem is surfaced per cycle, by priority: depth, then
//! posture, then tempo.

use serde::{Deserialize, Serialize};

use crate::angle::is_observed;
use crate::cycle::CycleDigest;
use crate::error::CoreError;
use crate::profile::{ExerciseProfile, SQUAT_POLICY};
use crate::threshold_validation::{validate_band, validate_degrees, validate_positive};
use crate::types::Degrees;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Inclusive angle band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleBand {
    pub min: Degrees,
    pub max: Degrees,
}

impl AngleBand {
    pub fn contains(&self, angle: Degrees) -> bool {
        (self.min..=self.max).contains(&angle)
    }
}

/// Inclusive band for the descent/ascent frame ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBand {
    pub min: f64,
    pub max: f64,
}

/// Thresholds applied to a digest. Missing fields take the squat defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackPolicy {
    /// Depth is insufficient when the cycle minimum stays above this.
    pub depth_ceiling: Degrees,
    /// Acceptable average torso angle.
    pub torso_band: AngleBand,
    /// Acceptable descent/ascent frame ratio.
    pub tempo_band: RatioBand,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        SQUAT_POLICY
    }
}

impl FeedbackPolicy {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_degrees(self.depth_ceiling, "depth_ceiling")?;
        validate_band(
            self.torso_band.min,
            self.torso_band.max,
            "torso_band",
            validate_degrees,
        )?;
        validate_band(
            self.tempo_band.min,
            self.tempo_band.max,
            "tempo_band",
            validate_positive,
        )
    }
}

// ---------------------------------------------------------------------------
// FormFeedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FormFeedback {
    InsufficientDepth { knee_min: Degrees, ceiling: Degrees },
    TorsoTooBent { torso_avg: Degrees },
    TorsoTooUpright { torso_avg: Degrees },
    DescentTooFast { ratio: f64 },
    AscentTooFast { ratio: f64 },
    Good,
    InsufficientData,
}

/// Pick the single highest-priority problem in `digest`.
pub fn evaluate(digest: &CycleDigest, policy: &FeedbackPolicy) -> FormFeedback {
    if digest.knee_min > policy.depth_ceiling {
        return FormFeedback::InsufficientDepth {
            knee_min: digest.knee_min,
            ceiling: policy.depth_ceiling,
        };
    }

    // No torso reading in the whole cycle: the torso rule is skipped.
    if is_observed(digest.torso_avg) {
        if digest.torso_avg < policy.torso_band.min {
            return FormFeedback::TorsoTooBent {
                torso_avg: digest.torso_avg,
            };
        }
        if digest.torso_avg > policy.torso_band.max {
            return FormFeedback::TorsoTooUpright {
                torso_avg: digest.torso_avg,
            };
        }
    }

    // An empty segment makes the ratio undefined; the tempo rule is skipped.
    if let Some(ratio) = digest.tempo_ratio() {
        if ratio < policy.tempo_band.min {
            return FormFeedback::DescentTooFast { ratio };
        }
        if ratio > policy.tempo_band.max {
            return FormFeedback::AscentTooFast { ratio };
        }
    }

    FormFeedback::Good
}

impl FormFeedback {
    pub fn is_problem(&self) -> bool {
        !matches!(self, FormFeedback::Good | FormFeedback::InsufficientData)
    }

    /// User-facing sentence for this result.
    pub fn message(&self, profile: ExerciseProfile) -> String {
        use ExerciseProfile::*;

        match (self, profile) {
            (FormFeedback::InsufficientData, _) => {
                "Not enough data for this rep. Keep your whole body in frame.".to_string()
            }
            (FormFeedback::Good, _) => format!("Good {}! Keep it up.", profile.display_name()),
            (FormFeedback::InsufficientDepth { .. }, ShoulderPress) => {
                "Lower the weight to shoulder height.".to_string()
            }
            (FormFeedback::InsufficientDepth { .. }, _) => {
                "Go deeper. Aim for thighs parallel to the floor.".to_string()
            }
            (FormFeedback::TorsoTooBent { .. }, ShoulderPress) => {
                "Don't arch your back. Brace your core.".to_string()
            }
            (FormFeedback::TorsoTooBent { .. }, Plank) => {
                "Keep shoulders, hips and ankles in one line.".to_string()
            }
            (FormFeedback::TorsoTooBent { .. }, Squat) => {
                "Keep your chest up. You're leaning too far forward.".to_string()
            }
            (FormFeedback::TorsoTooUpright { .. }, _) => {
                "Hinge at the hips a little more.".to_string()
            }
            (FormFeedback::DescentTooFast { .. }, _) => {
                "Lower more slowly and stay in control.".to_string()
            }
            (FormFeedback::AscentTooFast { .. }, _) => {
                "Rise more slowly. Don't rush the way up.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::profile::SHOULDER_PRESS_POLICY;

    fn digest(knee_min: f64, torso_avg: f64, descent: usize, ascent: usize) -> CycleDigest {
        CycleDigest {
            frame_count: 10,
            duration_sec: 2.0,
            knee_min,
            knee_max: 170.0,
            knee_range: 170.0 - knee_min,
            torso_min: torso_avg - 5.0,
            torso_max: torso_avg + 5.0,
            torso_avg,
            torso_range: 10.0,
            descent_frames: descent,
            ascent_frames: ascent,
        }
    }

    // -- evaluate -------------------------------------------------------------

    #[test]
    fn good_cycle() {
        assert_eq!(evaluate(&digest(80.0, 85.0, 5, 5), &SQUAT_POLICY), FormFeedback::Good);
    }

    #[test]
    fn shallow_squat_flags_depth() {
        assert_matches!(
            evaluate(&digest(120.0, 85.0, 5, 5), &SQUAT_POLICY),
            FormFeedback::InsufficientDepth { knee_min, ceiling } if knee_min == 120.0 && ceiling == 110.0
        );
    }

    #[test]
    fn depth_outranks_posture_and_tempo() {
        assert_matches!(
            evaluate(&digest(130.0, 40.0, 1, 9), &SQUAT_POLICY),
            FormFeedback::InsufficientDepth { .. }
        );
    }

    #[test]
    fn posture_outranks_tempo() {
        assert_matches!(
            evaluate(&digest(80.0, 40.0, 1, 9), &SQUAT_POLICY),
            FormFeedback::TorsoTooBent { .. }
        );
        assert_matches!(
            evaluate(&digest(80.0, 130.0, 1, 9), &SQUAT_POLICY),
            FormFeedback::TorsoTooUpright { .. }
        );
    }

    #[test]
    fn tempo_flags_both_directions() {
        assert_matches!(
            evaluate(&digest(80.0, 85.0, 2, 10), &SQUAT_POLICY),
            FormFeedback::DescentTooFast { ratio } if (ratio - 0.2).abs() < 1e-12
        );
        assert_matches!(
            evaluate(&digest(80.0, 85.0, 10, 2), &SQUAT_POLICY),
            FormFeedback::AscentTooFast { .. }
        );
    }

    #[test]
    fn empty_segment_skips_tempo_rule() {
        assert_eq!(evaluate(&digest(80.0, 85.0, 0, 10), &SQUAT_POLICY), FormFeedback::Good);
        assert_eq!(evaluate(&digest(80.0, 85.0, 10, 0), &SQUAT_POLICY), FormFeedback::Good);
    }

    #[test]
    fn counted_press_that_stops_short_flags_depth() {
        // Counted as a rep (under 100) but not down to the 90 ceiling.
        assert_matches!(
            evaluate(&digest(95.0, 170.0, 5, 5), &SHOULDER_PRESS_POLICY),
            FormFeedback::InsufficientDepth { ceiling, .. } if ceiling == 90.0
        );
        assert_eq!(evaluate(&digest(85.0, 170.0, 5, 5), &SHOULDER_PRESS_POLICY), FormFeedback::Good);
    }

    #[test]
    fn unseen_torso_skips_posture_rule() {
        let mut blind = digest(80.0, 0.0, 5, 5);
        blind.torso_min = 0.0;
        blind.torso_max = 0.0;
        blind.torso_range = 0.0;
        assert_eq!(evaluate(&blind, &SQUAT_POLICY), FormFeedback::Good);
    }

    #[test]
    fn caller_band_replaces_default() {
        // 85 is fine for a squat but far too bent for an upright press.
        assert_matches!(
            evaluate(&digest(80.0, 85.0, 5, 5), &SHOULDER_PRESS_POLICY),
            FormFeedback::TorsoTooBent { .. }
        );
    }

    // -- FeedbackPolicy -------------------------------------------------------

    #[test]
    fn partial_policy_fills_defaults() {
        let policy: FeedbackPolicy =
            serde_json::from_str(r#"{"depth_ceiling": 90.0}"#).unwrap();
        assert_eq!(policy.depth_ceiling, 90.0);
        assert_eq!(policy.torso_band, SQUAT_POLICY.torso_band);
    }

    #[test]
    fn inverted_band_is_invalid() {
        let policy = FeedbackPolicy {
            torso_band: AngleBand {
                min: 110.0,
                max: 60.0,
            },
            ..SQUAT_POLICY
        };
        assert!(policy.validate().is_err());
    }

    // -- message --------------------------------------------------------------

    #[test]
    fn messages_depend_on_profile() {
        let depth = FormFeedback::InsufficientDepth {
            knee_min: 120.0,
            ceiling: 110.0,
        };
        assert_ne!(
            depth.message(ExerciseProfile::Squat),
            depth.message(ExerciseProfile::ShoulderPress)
        );
        assert!(FormFeedback::Good
            .message(ExerciseProfile::Plank)
            .contains("plank"));
    }
}
