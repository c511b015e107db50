//! Per-frame metrics derived from one landmark set.

use serde::{Deserialize, Serialize};

use crate::angle::{calculate_angle, is_observed, NO_ANGLE};
use crate::landmarks::{BodyPart, Joint, LandmarkSet, Side};
use crate::types::Degrees;

/// Tolerance (normalised units) when comparing heel and toe heights.
pub const HEEL_GROUND_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// AngleSpace
// ---------------------------------------------------------------------------

/// Whether angles use the model's depth estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleSpace {
    /// Image-plane angles from `(x, y)` only.
    Planar,
    /// `(x, y, z)` when all three landmarks carry depth, planar otherwise.
    #[default]
    Spatial,
}

impl std::str::FromStr for AngleSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planar" | "2d" => Ok(AngleSpace::Planar),
            "spatial" | "3d" => Ok(AngleSpace::Spatial),
            other => Err(format!("unknown angle space '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// AngleKind
// ---------------------------------------------------------------------------

/// A named joint angle and the landmark triple that feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleKind {
    /// hip - knee - ankle
    Knee,
    /// shoulder - hip - knee
    Torso,
    /// shoulder - elbow - wrist
    Elbow,
    /// shoulder - hip - ankle
    BodyLine,
}

impl AngleKind {
    /// `(a, vertex, c)` body parts.
    pub const fn joints(self) -> [BodyPart; 3] {
        use BodyPart::*;
        match self {
            AngleKind::Knee => [Hip, Knee, Ankle],
            AngleKind::Torso => [Shoulder, Hip, Knee],
            AngleKind::Elbow => [Shoulder, Elbow, Wrist],
            AngleKind::BodyLine => [Shoulder, Hip, Ankle],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AngleKind::Knee => "knee",
            AngleKind::Torso => "torso",
            AngleKind::Elbow => "elbow",
            AngleKind::BodyLine => "body line",
        }
    }
}

// ---------------------------------------------------------------------------
// BilateralAngle
// ---------------------------------------------------------------------------

/// Left and right readings of one angle kind. A side that could not be
/// measured holds [`NO_ANGLE`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BilateralAngle {
    pub left: Degrees,
    pub right: Degrees,
}

impl BilateralAngle {
    pub const fn new(left: Degrees, right: Degrees) -> Self {
        Self { left, right }
    }

    /// Mean over the observed sides; `None` when neither side was observed.
    pub fn mean(&self) -> Option<Degrees> {
        match (is_observed(self.left), is_observed(self.right)) {
            (true, true) => Some((self.left + self.right) / 2.0),
            (true, false) => Some(self.left),
            (false, true) => Some(self.right),
            (false, false) => None,
        }
    }

    fn side(&self, side: Side) -> Degrees {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameMetrics
// ---------------------------------------------------------------------------

/// Immutable per-frame snapshot of angles and squat flags.
///
/// Auxiliary flags are `None` when the landmarks they need are missing
/// (COCO layouts never report heels or toes).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub knee: BilateralAngle,
    pub torso: BilateralAngle,
    pub elbow: BilateralAngle,
    pub body_line: BilateralAngle,
    /// Both hips below their knees.
    pub depth_ok: Option<bool>,
    /// Horizontal knee-over-toe distance.
    pub knee_align_left: Option<f64>,
    pub knee_align_right: Option<f64>,
    pub heel_grounded_left: Option<bool>,
    pub heel_grounded_right: Option<bool>,
}

impl FrameMetrics {
    pub fn from_landmarks(set: &LandmarkSet, space: AngleSpace, min_visibility: f64) -> Self {
        let bilateral = |kind: AngleKind| {
            BilateralAngle::new(
                side_angle(set, kind, Side::Left, space, min_visibility),
                side_angle(set, kind, Side::Right, space, min_visibility),
            )
        };
        let point = |side: Side, part: BodyPart| set.visible(Joint::on(side, part), min_visibility);

        let depth_ok = Side::BOTH
            .iter()
            .map(|&side| {
                let hip = point(side, BodyPart::Hip)?;
                let knee = point(side, BodyPart::Knee)?;
                Some(hip.y > knee.y)
            })
            .collect::<Option<Vec<bool>>>()
            .map(|sides| sides.iter().all(|&deep| deep));

        let knee_align = |side: Side| {
            let knee = point(side, BodyPart::Knee)?;
            let toe = point(side, BodyPart::FootIndex)?;
            Some((knee.x - toe.x).abs())
        };

        // A lifted heel sits visibly higher (smaller y) than the toe.
        let heel_grounded = |side: Side| {
            let heel = point(side, BodyPart::Heel)?;
            let toe = point(side, BodyPart::FootIndex)?;
            Some(heel.y >= toe.y - HEEL_GROUND_TOLERANCE)
        };

        Self {
            knee: bilateral(AngleKind::Knee),
            torso: bilateral(AngleKind::Torso),
            elbow: bilateral(AngleKind::Elbow),
            body_line: bilateral(AngleKind::BodyLine),
            depth_ok,
            knee_align_left: knee_align(Side::Left),
            knee_align_right: knee_align(Side::Right),
            heel_grounded_left: heel_grounded(Side::Left),
            heel_grounded_right: heel_grounded(Side::Right),
        }
    }

    pub fn angle(&self, kind: AngleKind) -> &BilateralAngle {
        match kind {
            AngleKind::Knee => &self.knee,
            AngleKind::Torso => &self.torso,
            AngleKind::Elbow => &self.elbow,
            AngleKind::BodyLine => &self.body_line,
        }
    }

    pub fn knee_angle_mean(&self) -> Option<Degrees> {
        self.knee.mean()
    }

    pub fn torso_angle_mean(&self) -> Option<Degrees> {
        self.torso.mean()
    }

    /// Reading of `kind` on one side, sentinel included.
    pub fn side_angle(&self, kind: AngleKind, side: Side) -> Degrees {
        self.angle(kind).side(side)
    }
}

fn side_angle(
    set: &LandmarkSet,
    kind: AngleKind,
    side: Side,
    space: AngleSpace,
    min_visibility: f64,
) -> Degrees {
    let [a, b, c] = kind.joints();
    let (Some(a), Some(b), Some(c)) = (
        set.visible(Joint::on(side, a), min_visibility),
        set.visible(Joint::on(side, b), min_visibility),
        set.visible(Joint::on(side, c), min_visibility),
    ) else {
        return NO_ANGLE;
    };

    if space == AngleSpace::Spatial {
        if let (Some(a), Some(b), Some(c)) = (a.xyz(), b.xyz(), c.xyz()) {
            return calculate_angle(a, b, c);
        }
    }
    calculate_angle(a.xy(), b.xy(), c.xy())
}
