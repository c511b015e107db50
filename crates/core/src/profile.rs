//! Exercise profiles.
//!
//! Each profile supplies its rep thresholds, feedback policy and the angle
//! kinds that feed the counter and the posture statistics.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::feedback::{AngleBand, FeedbackPolicy, RatioBand};
use crate::landmarks::BodyPart;
use crate::metrics::AngleKind;
use crate::rep_counter::RepThresholds;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const SQUAT_THRESHOLDS: RepThresholds = RepThresholds {
    down_threshold: 95.0,
    up_threshold: 155.0,
    minimum_cycle_frames: 5,
};

pub const SHOULDER_PRESS_THRESHOLDS: RepThresholds = RepThresholds {
    down_threshold: 100.0,
    up_threshold: 150.0,
    minimum_cycle_frames: 5,
};

/// Standard tempo band for descent/ascent frame ratios.
pub const DEFAULT_TEMPO_BAND: RatioBand = RatioBand {
    min: 0.3,
    max: 3.0,
};

pub const SQUAT_POLICY: FeedbackPolicy = FeedbackPolicy {
    depth_ceiling: 110.0,
    torso_band: AngleBand {
        min: 60.0,
        max: 110.0,
    },
    tempo_band: DEFAULT_TEMPO_BAND,
};

/// The press is counted once the elbow drops under 100, so the depth
/// ceiling sits below that to stay reachable.
pub const SHOULDER_PRESS_POLICY: FeedbackPolicy = FeedbackPolicy {
    depth_ceiling: 90.0,
    torso_band: AngleBand {
        min: 150.0,
        max: 180.0,
    },
    tempo_band: DEFAULT_TEMPO_BAND,
};

/// Plank body line: shoulder, hip and ankle close to a straight line.
pub const PLANK_BODY_LINE: AngleBand = AngleBand {
    min: 160.0,
    max: 180.0,
};

pub const PLANK_POLICY: FeedbackPolicy = FeedbackPolicy {
    depth_ceiling: 180.0,
    torso_band: PLANK_BODY_LINE,
    tempo_band: DEFAULT_TEMPO_BAND,
};

// ---------------------------------------------------------------------------
// ExerciseProfile
// ---------------------------------------------------------------------------

/// How progress is measured for a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tracking {
    /// Counted repetitions.
    Reps(RepThresholds),
    /// Timed hold while the primary angle stays in the band.
    Hold(AngleBand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseProfile {
    #[default]
    Squat,
    ShoulderPress,
    Plank,
}

impl ExerciseProfile {
    pub const ALL: [ExerciseProfile; 3] = [
        ExerciseProfile::Squat,
        ExerciseProfile::ShoulderPress,
        ExerciseProfile::Plank,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            ExerciseProfile::Squat => "squat",
            ExerciseProfile::ShoulderPress => "shoulder_press",
            ExerciseProfile::Plank => "plank",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            ExerciseProfile::Squat => "squat",
            ExerciseProfile::ShoulderPress => "shoulder press",
            ExerciseProfile::Plank => "plank",
        }
    }

    /// Angle followed by the rep counter (or the hold timer for planks).
    pub const fn primary_angle(self) -> AngleKind {
        match self {
            ExerciseProfile::Squat => AngleKind::Knee,
            ExerciseProfile::ShoulderPress => AngleKind::Elbow,
            ExerciseProfile::Plank => AngleKind::BodyLine,
        }
    }

    /// Angle summarised as the cycle's posture statistic.
    pub const fn secondary_angle(self) -> AngleKind {
        match self {
            ExerciseProfile::Squat | ExerciseProfile::ShoulderPress => AngleKind::Torso,
            ExerciseProfile::Plank => AngleKind::BodyLine,
        }
    }

    pub const fn tracking(self) -> Tracking {
        match self {
            ExerciseProfile::Squat => Tracking::Reps(SQUAT_THRESHOLDS),
            ExerciseProfile::ShoulderPress => Tracking::Reps(SHOULDER_PRESS_THRESHOLDS),
            ExerciseProfile::Plank => Tracking::Hold(PLANK_BODY_LINE),
        }
    }

    /// `None` for timed holds.
    pub const fn rep_thresholds(self) -> Option<RepThresholds> {
        match self.tracking() {
            Tracking::Reps(thresholds) => Some(thresholds),
            Tracking::Hold(_) => None,
        }
    }

    pub const fn feedback_policy(self) -> FeedbackPolicy {
        match self {
            ExerciseProfile::Squat => SQUAT_POLICY,
            ExerciseProfile::ShoulderPress => SHOULDER_PRESS_POLICY,
            ExerciseProfile::Plank => PLANK_POLICY,
        }
    }

    /// Band the primary angle must stay in for hold time to accrue.
    pub const fn hold_band(self) -> Option<AngleBand> {
        match self.tracking() {
            Tracking::Hold(band) => Some(band),
            Tracking::Reps(_) => None,
        }
    }

    /// Body parts whose absence makes a frame unusable.
    pub const fn required_parts(self) -> &'static [BodyPart] {
        match self {
            ExerciseProfile::Squat => &[
                BodyPart::Shoulder,
                BodyPart::Hip,
                BodyPart::Knee,
                BodyPart::Ankle,
            ],
            ExerciseProfile::ShoulderPress => &[
                BodyPart::Shoulder,
                BodyPart::Elbow,
                BodyPart::Wrist,
                BodyPart::Hip,
            ],
            ExerciseProfile::Plank => &[
                BodyPart::Shoulder,
                BodyPart::Elbow,
                BodyPart::Hip,
                BodyPart::Ankle,
            ],
        }
    }

    pub const fn is_timed(self) -> bool {
        matches!(self.tracking(), Tracking::Hold(_))
    }
}

impl std::fmt::Display for ExerciseProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ExerciseProfile {
    type Err = CoreError;

    /// Accepts slugs, common spellings and the Korean names sent by the
    /// web client.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect();

        match normalized.as_str() {
            "squat" | "squats" | "스쿼트" => Ok(ExerciseProfile::Squat),
            "shoulderpress" | "press" | "overheadpress" | "숄더프레스" => {
                Ok(ExerciseProfile::ShoulderPress)
            }
            "plank" | "planks" | "플랭크" => Ok(ExerciseProfile::Plank),
            _ => Err(CoreError::UnknownExercise(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // -- FromStr --------------------------------------------------------------

    #[test]
    fn parses_slugs_and_aliases() {
        assert_eq!("squat".parse::<ExerciseProfile>().unwrap(), ExerciseProfile::Squat);
        assert_eq!(
            "Shoulder-Press".parse::<ExerciseProfile>().unwrap(),
            ExerciseProfile::ShoulderPress
        );
        assert_eq!(" plank ".parse::<ExerciseProfile>().unwrap(), ExerciseProfile::Plank);
    }

    #[test]
    fn parses_korean_names() {
        assert_eq!("스쿼트".parse::<ExerciseProfile>().unwrap(), ExerciseProfile::Squat);
        assert_eq!(
            "숄더 프레스".parse::<ExerciseProfile>().unwrap(),
            ExerciseProfile::ShoulderPress
        );
        assert_eq!("플랭크".parse::<ExerciseProfile>().unwrap(), ExerciseProfile::Plank);
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert_matches!(
            "burpee".parse::<ExerciseProfile>(),
            Err(CoreError::UnknownExercise(name)) if name == "burpee"
        );
    }

    #[test]
    fn slug_round_trips_through_parse() {
        for profile in ExerciseProfile::ALL {
            assert_eq!(profile.slug().parse::<ExerciseProfile>().unwrap(), profile);
        }
    }

    // -- configuration --------------------------------------------------------

    #[test]
    fn every_profile_configuration_is_valid() {
        for profile in ExerciseProfile::ALL {
            if let Some(thresholds) = profile.rep_thresholds() {
                thresholds.validate().unwrap();
            }
            profile.feedback_policy().validate().unwrap();
        }
    }

    #[test]
    fn press_depth_ceiling_is_below_the_counting_threshold() {
        let thresholds = ExerciseProfile::ShoulderPress.rep_thresholds().unwrap();
        let policy = ExerciseProfile::ShoulderPress.feedback_policy();
        assert!(policy.depth_ceiling < thresholds.down_threshold);
    }

    #[test]
    fn only_plank_is_timed() {
        assert!(ExerciseProfile::Plank.is_timed());
        assert!(ExerciseProfile::Plank.rep_thresholds().is_none());
        assert!(ExerciseProfile::Plank.hold_band().is_some());
        assert!(!ExerciseProfile::Squat.is_timed());
    }
}
