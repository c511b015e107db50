//! Instant per-frame posture warnings.
//!
//! Cheap geometric checks on raw landmark positions, run on every observed
//! frame. Warnings seen during a rep are tallied and the most frequent one
//! is recorded with that rep.

use serde::{Deserialize, Serialize};

use crate::landmarks::{BodyPart, Joint, Landmark, LandmarkSet, Side};
use crate::metrics::FrameMetrics;
use crate::profile::ExerciseProfile;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Knees closer together than this fraction of hip width read as valgus.
pub const KNEE_VALGUS_RATIO: f64 = 0.8;

/// Maximum left/right hip height difference (normalised units).
pub const PELVIS_TILT_TOLERANCE: f64 = 0.05;

/// Maximum left/right shoulder height difference (normalised units).
pub const SHOULDER_TILT_TOLERANCE: f64 = 0.04;

/// Mean knee angle below which a squat is dangerously deep.
pub const TOO_DEEP_KNEE_ANGLE: f64 = 60.0;

/// Allowed hip deviation from the shoulder-ankle line in a plank.
pub const PLANK_LINE_TOLERANCE: f64 = 0.05;

/// Allowed horizontal elbow offset from the shoulder in a plank.
pub const PLANK_ELBOW_TOLERANCE: f64 = 0.05;

/// How far below the shoulder the ear may drop in a plank.
pub const PLANK_HEAD_DROP_TOLERANCE: f64 = 0.05;

// ---------------------------------------------------------------------------
// PostureIssue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureIssue {
    KneeValgus,
    PelvisTilt,
    ShoulderTilt,
    TooDeep,
    HipsSagging,
    HipsPiked,
    ElbowNotUnderShoulder,
    HeadDropped,
}

impl PostureIssue {
    pub const fn message(self) -> &'static str {
        match self {
            PostureIssue::KneeValgus => "Knees caving in! Push them out.",
            PostureIssue::PelvisTilt => "Hips are uneven. Stay balanced.",
            PostureIssue::ShoulderTilt => "Upper body is tilting.",
            PostureIssue::TooDeep => "Too deep! Risk of injury.",
            PostureIssue::HipsSagging => "Lower back is sagging. Brace your core.",
            PostureIssue::HipsPiked => "Hips too high. Make a straight line.",
            PostureIssue::ElbowNotUnderShoulder => "Keep elbows under your shoulders.",
            PostureIssue::HeadDropped => "Lift your head. Eyes on the floor ahead.",
        }
    }

    /// Short label used in rep history and report prompts.
    pub const fn label(self) -> &'static str {
        match self {
            PostureIssue::KneeValgus => "knee valgus",
            PostureIssue::PelvisTilt => "pelvis tilt",
            PostureIssue::ShoulderTilt => "shoulder tilt",
            PostureIssue::TooDeep => "too deep",
            PostureIssue::HipsSagging => "sagging hips",
            PostureIssue::HipsPiked => "piked hips",
            PostureIssue::ElbowNotUnderShoulder => "elbow placement",
            PostureIssue::HeadDropped => "dropped head",
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Warnings for one observed frame.
pub fn detect(
    profile: ExerciseProfile,
    set: &LandmarkSet,
    metrics: &FrameMetrics,
    min_visibility: f64,
) -> Vec<PostureIssue> {
    match profile {
        ExerciseProfile::Squat => detect_squat(set, metrics, min_visibility),
        ExerciseProfile::Plank => detect_plank(set, min_visibility),
        ExerciseProfile::ShoulderPress => Vec::new(),
    }
}

fn detect_squat(set: &LandmarkSet, metrics: &FrameMetrics, min_visibility: f64) -> Vec<PostureIssue> {
    let mut issues = Vec::new();
    let pair = |part: BodyPart| {
        Some((
            set.visible(Joint::left(part), min_visibility)?,
            set.visible(Joint::right(part), min_visibility)?,
        ))
    };

    if let (Some((l_hip, r_hip)), Some((l_knee, r_knee))) = (pair(BodyPart::Hip), pair(BodyPart::Knee)) {
        let hip_width = (l_hip.x - r_hip.x).abs();
        let knee_width = (l_knee.x - r_knee.x).abs();
        if knee_width < hip_width * KNEE_VALGUS_RATIO {
            issues.push(PostureIssue::KneeValgus);
        }
    }

    if let Some((l_hip, r_hip)) = pair(BodyPart::Hip) {
        if (l_hip.y - r_hip.y).abs() > PELVIS_TILT_TOLERANCE {
            issues.push(PostureIssue::PelvisTilt);
        }
    }

    if let Some((l_sh, r_sh)) = pair(BodyPart::Shoulder) {
        if (l_sh.y - r_sh.y).abs() > SHOULDER_TILT_TOLERANCE {
            issues.push(PostureIssue::ShoulderTilt);
        }
    }

    if metrics
        .knee_angle_mean()
        .is_some_and(|knee| knee < TOO_DEEP_KNEE_ANGLE)
    {
        issues.push(PostureIssue::TooDeep);
    }

    issues
}

struct PlankSide<'a> {
    ear: Option<&'a Landmark>,
    shoulder: &'a Landmark,
    elbow: &'a Landmark,
    hip: &'a Landmark,
    ankle: &'a Landmark,
}

/// The side facing the camera: the first with every required point visible.
fn plank_side(set: &LandmarkSet, min_visibility: f64) -> Option<PlankSide<'_>> {
    Side::BOTH.into_iter().find_map(|side| {
        let get = |part| set.visible(Joint::on(side, part), min_visibility);
        Some(PlankSide {
            ear: get(BodyPart::Ear),
            shoulder: get(BodyPart::Shoulder)?,
            elbow: get(BodyPart::Elbow)?,
            hip: get(BodyPart::Hip)?,
            ankle: get(BodyPart::Ankle)?,
        })
    })
}

fn detect_plank(set: &LandmarkSet, min_visibility: f64) -> Vec<PostureIssue> {
    let mut issues = Vec::new();
    let Some(side) = plank_side(set, min_visibility) else {
        return issues;
    };

    let dx = side.ankle.x - side.shoulder.x;
    if dx.abs() > f64::EPSILON {
        let slope = (side.ankle.y - side.shoulder.y) / dx;
        let expected_hip_y = side.shoulder.y + slope * (side.hip.x - side.shoulder.x);
        if side.hip.y > expected_hip_y + PLANK_LINE_TOLERANCE {
            issues.push(PostureIssue::HipsSagging);
        } else if side.hip.y < expected_hip_y - PLANK_LINE_TOLERANCE {
            issues.push(PostureIssue::HipsPiked);
        }
    }

    if (side.shoulder.x - side.elbow.x).abs() > PLANK_ELBOW_TOLERANCE {
        issues.push(PostureIssue::ElbowNotUnderShoulder);
    }

    if let Some(ear) = side.ear {
        if ear.y > side.shoulder.y + PLANK_HEAD_DROP_TOLERANCE {
            issues.push(PostureIssue::HeadDropped);
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// IssueTally
// ---------------------------------------------------------------------------

/// Occurrence counts of warnings within one rep.
#[derive(Debug, Clone, Default)]
pub struct IssueTally {
    counts: Vec<(PostureIssue, u32)>,
}

impl IssueTally {
    pub fn record(&mut self, issues: &[PostureIssue]) {
        for &issue in issues {
            match self.counts.iter_mut().find(|(seen, _)| *seen == issue) {
                Some((_, count)) => *count += 1,
                None => self.counts.push((issue, 1)),
            }
        }
    }

    /// Most frequent warning; ties go to the one seen first.
    pub fn dominant(&self) -> Option<PostureIssue> {
        let mut best: Option<(PostureIssue, u32)> = None;
        for &(issue, count) in &self.counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((issue, count));
            }
        }
        best.map(|(issue, _)| issue)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
