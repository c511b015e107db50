//! Pose landmarks as produced by an external pose model.
//!
//! Coordinates are normalised to `0..1` per axis with `y` growing downward.
//! Two skeleton layouts are understood: MediaPipe BlazePose (33 points) and
//! the COCO keypoint set (17 points) used by YOLO-pose models.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default visibility gate. Landmarks reporting a lower visibility are
/// treated as undetected.
pub const DEFAULT_MIN_VISIBILITY: f64 = 0.5;

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// One detected point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Per-landmark confidence in `0..1`. Absent means "assume visible".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: None,
        }
    }

    pub const fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub const fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Spatial position, if the model reported depth.
    pub fn xyz(&self) -> Option<[f64; 3]> {
        self.z.map(|z| [self.x, self.y, z])
    }

    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility.map_or(true, |v| v >= min_visibility)
    }
}

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Ear,
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
    Heel,
    FootIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

/// A named anatomical point on one side of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Joint {
    pub part: BodyPart,
    pub side: Side,
}

impl Joint {
    pub const fn left(part: BodyPart) -> Self {
        Self {
            part,
            side: Side::Left,
        }
    }

    pub const fn right(part: BodyPart) -> Self {
        Self {
            part,
            side: Side::Right,
        }
    }

    pub const fn on(side: Side, part: BodyPart) -> Self {
        Self { part, side }
    }
}

// ---------------------------------------------------------------------------
// LandmarkLayout
// ---------------------------------------------------------------------------

/// Skeleton layout of a landmark list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LandmarkLayout {
    /// MediaPipe BlazePose, 33 points.
    #[default]
    #[serde(rename = "blazepose33", alias = "mediapipe")]
    BlazePose33,
    /// COCO keypoints, 17 points. No heels or foot indices.
    #[serde(rename = "coco17", alias = "yolo")]
    Coco17,
}

impl LandmarkLayout {
    /// Number of points a landmark list in this layout carries.
    pub const fn point_count(self) -> usize {
        match self {
            LandmarkLayout::BlazePose33 => 33,
            LandmarkLayout::Coco17 => 17,
        }
    }

    /// Index of `joint` in this layout, or `None` if the layout lacks it.
    pub const fn index(self, joint: Joint) -> Option<usize> {
        use BodyPart::*;

        let left = matches!(joint.side, Side::Left);
        let (l, r) = match self {
            LandmarkLayout::BlazePose33 => match joint.part {
                Ear => (7, 8),
                Shoulder => (11, 12),
                Elbow => (13, 14),
                Wrist => (15, 16),
                Hip => (23, 24),
                Knee => (25, 26),
                Ankle => (27, 28),
                Heel => (29, 30),
                FootIndex => (31, 32),
            },
            LandmarkLayout::Coco17 => match joint.part {
                Ear => (3, 4),
                Shoulder => (5, 6),
                Elbow => (7, 8),
                Wrist => (9, 10),
                Hip => (11, 12),
                Knee => (13, 14),
                Ankle => (15, 16),
                Heel | FootIndex => return None,
            },
        };
        Some(if left { l } else { r })
    }
}

// ---------------------------------------------------------------------------
// LandmarkSet
// ---------------------------------------------------------------------------

/// All landmarks detected in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkSet {
    layout: LandmarkLayout,
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Build a set, checking the point count matches the layout.
    pub fn new(layout: LandmarkLayout, points: Vec<Landmark>) -> Result<Self, CoreError> {
        let expected = layout.point_count();
        if points.len() != expected {
            return Err(CoreError::Validation(format!(
                "{layout:?} layout expects {expected} landmarks, got {}",
                points.len()
            )));
        }
        Ok(Self { layout, points })
    }

    pub fn layout(&self) -> LandmarkLayout {
        self.layout
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.layout
            .index(joint)
            .and_then(|index| self.points.get(index))
    }

    /// Like [`get`](Self::get), but treats low-visibility points as missing.
    pub fn visible(&self, joint: Joint, min_visibility: f64) -> Option<&Landmark> {
        self.get(joint).filter(|lm| lm.is_visible(min_visibility))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A BlazePose frame with every point parked at the centre.
    pub fn blank_blazepose() -> Vec<Landmark> {
        vec![Landmark::new(0.5, 0.5); LandmarkLayout::BlazePose33.point_count()]
    }

    pub fn place(points: &mut [Landmark], joint: Joint, lm: Landmark) {
        let index = LandmarkLayout::BlazePose33
            .index(joint)
            .expect("BlazePose has every joint");
        points[index] = lm;
    }

    /// Side-view squat skeleton with the given knee angle in degrees, both
    /// legs identical. Knee at (0.5, 0.6), shank vertical, thigh rotated
    /// away from the shank by `180 - knee_angle`, trunk vertical.
    pub fn squat_pose(knee_angle: f64) -> LandmarkSet {
        let mut points = blank_blazepose();
        let theta = (180.0 - knee_angle).to_radians();
        let knee = (0.5, 0.6);
        let ankle = (0.5, 0.85);
        let hip = (knee.0 + 0.3 * theta.sin(), knee.1 - 0.3 * theta.cos());
        let shoulder = (hip.0, hip.1 - 0.35);

        for side in Side::BOTH {
            let dx = match side {
                Side::Left => -0.08,
                Side::Right => 0.08,
            };
            place(
                &mut points,
                Joint::on(side, BodyPart::Shoulder),
                Landmark::new(shoulder.0 + dx, shoulder.1),
            );
            place(
                &mut points,
                Joint::on(side, BodyPart::Ear),
                Landmark::new(shoulder.0 + dx, shoulder.1 - 0.08),
            );
            place(
                &mut points,
                Joint::on(side, BodyPart::Hip),
                Landmark::new(hip.0 + dx, hip.1),
            );
            place(
                &mut points,
                Joint::on(side, BodyPart::Knee),
                Landmark::new(knee.0 + dx, knee.1),
            );
            place(
                &mut points,
                Joint::on(side, BodyPart::Ankle),
                Landmark::new(ankle.0 + dx, ankle.1),
            );
            place(
                &mut points,
                Joint::on(side, BodyPart::Heel),
                Landmark::new(ankle.0 + dx - 0.02, ankle.1 + 0.03),
            );
            place(
                &mut points,
                Joint::on(side, BodyPart::FootIndex),
                Landmark::new(ankle.0 + dx + 0.06, ankle.1 + 0.03),
            );
        }

        LandmarkSet::new(LandmarkLayout::BlazePose33, points).expect("33 points")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    // -- LandmarkLayout::index ------------------------------------------------

    #[test]
    fn blazepose_indices_follow_mediapipe_numbering() {
        let layout = LandmarkLayout::BlazePose33;
        assert_eq!(layout.index(Joint::left(BodyPart::Shoulder)), Some(11));
        assert_eq!(layout.index(Joint::right(BodyPart::Hip)), Some(24));
        assert_eq!(layout.index(Joint::left(BodyPart::Knee)), Some(25));
        assert_eq!(layout.index(Joint::right(BodyPart::FootIndex)), Some(32));
    }

    #[test]
    fn coco_has_no_feet() {
        let layout = LandmarkLayout::Coco17;
        assert_eq!(layout.index(Joint::left(BodyPart::Hip)), Some(11));
        assert_eq!(layout.index(Joint::right(BodyPart::Ankle)), Some(16));
        assert_eq!(layout.index(Joint::left(BodyPart::Heel)), None);
        assert_eq!(layout.index(Joint::right(BodyPart::FootIndex)), None);
    }

    // -- LandmarkSet ----------------------------------------------------------

    #[test]
    fn rejects_wrong_point_count() {
        let result = LandmarkSet::new(LandmarkLayout::Coco17, blank_blazepose());
        assert!(result.is_err());
    }

    #[test]
    fn visible_filters_low_confidence_points() {
        let mut points = blank_blazepose();
        place(
            &mut points,
            Joint::left(BodyPart::Knee),
            Landmark::new(0.4, 0.6).with_visibility(0.2),
        );
        let set = LandmarkSet::new(LandmarkLayout::BlazePose33, points).unwrap();

        assert!(set.get(Joint::left(BodyPart::Knee)).is_some());
        assert!(set
            .visible(Joint::left(BodyPart::Knee), DEFAULT_MIN_VISIBILITY)
            .is_none());
        // Points without a reported visibility pass the gate.
        assert!(set
            .visible(Joint::right(BodyPart::Knee), DEFAULT_MIN_VISIBILITY)
            .is_some());
    }

    #[test]
    fn landmark_deserializes_without_optional_fields() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2}"#).unwrap();
        assert_eq!(lm, Landmark::new(0.1, 0.2));
        assert_eq!(lm.xyz(), None);
    }

    #[test]
    fn layout_accepts_model_aliases() {
        let layout: LandmarkLayout = serde_json::from_str(r#""yolo""#).unwrap();
        assert_eq!(layout, LandmarkLayout::Coco17);
        let layout: LandmarkLayout = serde_json::from_str(r#""blazepose33""#).unwrap();
        assert_eq!(layout, LandmarkLayout::BlazePose33);
    }
}
