//! One user's exercise session.
//!
//! [`ExerciseSession`] owns all per-session state: the profile, the rep
//! counter (or hold timer), the cycle buffer, the warning tally and the rep
//! history. The transport layer creates one per connection and feeds it
//! frames strictly in arrival order.

use std::sync::Arc;

use serde::Serialize;

use crate::angle::NO_ANGLE;
use crate::cycle::{analyze_cycle_with_floor, CycleDigest, CycleRecorder, CycleSample};
use crate::feedback::{evaluate, FormFeedback};
use crate::hold::HoldTimer;
use crate::landmarks::{Joint, LandmarkSet, Side, DEFAULT_MIN_VISIBILITY};
use crate::metrics::{AngleSpace, FrameMetrics};
use crate::posture::{self, IssueTally, PostureIssue};
use crate::profile::{ExerciseProfile, Tracking};
use crate::rep_counter::RepCounter;
use crate::types::{Degrees, Timestamp};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub angle_space: AngleSpace,
    pub min_visibility: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            angle_space: AngleSpace::default(),
            min_visibility: DEFAULT_MIN_VISIBILITY,
        }
    }
}

/// One frame from the pose model. `landmarks` is `None` when nothing was
/// detected; `image` is the camera frame as a data URL, if the client sent one.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub landmarks: Option<LandmarkSet>,
    pub timestamp_ms: f64,
    pub image: Option<Arc<str>>,
}

/// What the rep counter captures at the lowest point of a rep.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub metrics: FrameMetrics,
    pub timestamp_ms: f64,
    pub image: Option<Arc<str>>,
}

#[derive(Debug, Clone)]
pub struct RepCompletion {
    pub rep_number: u32,
    pub lowest_angle: Degrees,
    pub snapshot: FrameSnapshot,
    /// `None` when the cycle was too short to analyse.
    pub digest: Option<CycleDigest>,
    pub feedback: FormFeedback,
    pub dominant_issue: Option<PostureIssue>,
}

#[derive(Debug, Clone)]
pub struct HoldCompletion {
    pub checkpoint: u32,
    pub held_secs: f64,
    pub snapshot: FrameSnapshot,
    pub dominant_issue: Option<PostureIssue>,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Rep(RepCompletion),
    Hold(HoldCompletion),
}

#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// `false` when the frame carried no usable detection and was skipped.
    pub observed: bool,
    pub warnings: Vec<PostureIssue>,
    pub event: Option<SessionEvent>,
}

/// One entry of the session history: a rep or a hold checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepRecord {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_angle: Option<Degrees>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FormFeedback>,
    pub dominant_issue: Option<PostureIssue>,
    pub at_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub profile: ExerciseProfile,
    pub reps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_secs: Option<f64>,
    pub history: Vec<RepRecord>,
    pub started_at: Option<Timestamp>,
    pub ended_at: Timestamp,
}

// ---------------------------------------------------------------------------
// ExerciseSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Tracker {
    Reps {
        counter: RepCounter<FrameSnapshot>,
        recorder: CycleRecorder,
    },
    Hold(HoldTimer),
}

impl Tracker {
    fn for_profile(profile: ExerciseProfile) -> Self {
        match profile.tracking() {
            Tracking::Reps(thresholds) => Tracker::Reps {
                counter: RepCounter::new(thresholds),
                recorder: CycleRecorder::new(thresholds.up_threshold),
            },
            Tracking::Hold(band) => Tracker::Hold(HoldTimer::new(band)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExerciseSession {
    profile: ExerciseProfile,
    config: SessionConfig,
    tracker: Tracker,
    tally: IssueTally,
    history: Vec<RepRecord>,
    is_recording: bool,
    started_at: Option<Timestamp>,
}

impl ExerciseSession {
    pub fn new(profile: ExerciseProfile, config: SessionConfig) -> Self {
        Self {
            profile,
            config,
            tracker: Tracker::for_profile(profile),
            tally: IssueTally::default(),
            history: Vec::new(),
            is_recording: false,
            started_at: None,
        }
    }

    pub fn profile(&self) -> ExerciseProfile {
        self.profile
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn history(&self) -> &[RepRecord] {
        &self.history
    }

    /// Completed reps (hold checkpoints for timed exercises).
    pub fn reps(&self) -> u32 {
        match &self.tracker {
            Tracker::Reps { counter, .. } => counter.rep_count(),
            Tracker::Hold(_) => self.history.len() as u32,
        }
    }

    /// Accumulated hold time, for timed exercises only.
    pub fn hold_secs(&self) -> Option<f64> {
        match &self.tracker {
            Tracker::Hold(timer) => Some(timer.held_secs()),
            Tracker::Reps { .. } => None,
        }
    }

    /// Process one frame. Never fails: unusable frames are reported as not
    /// observed and leave every piece of state untouched.
    pub fn process_frame(&mut self, input: FrameInput) -> FrameOutcome {
        let Some(landmarks) = input.landmarks.as_ref() else {
            return FrameOutcome::default();
        };
        if !self.has_required_parts(landmarks) {
            return FrameOutcome::default();
        }

        let profile = self.profile;
        let metrics =
            FrameMetrics::from_landmarks(landmarks, self.config.angle_space, self.config.min_visibility);
        let Some(primary) = metrics.angle(profile.primary_angle()).mean() else {
            return FrameOutcome::default();
        };

        let warnings = posture::detect(profile, landmarks, &metrics, self.config.min_visibility);
        self.tally.record(&warnings);

        let snapshot = FrameSnapshot {
            metrics,
            timestamp_ms: input.timestamp_ms,
            image: input.image,
        };

        let event = match &mut self.tracker {
            Tracker::Reps { counter, recorder } => {
                let secondary = metrics
                    .angle(profile.secondary_angle())
                    .mean()
                    .unwrap_or(NO_ANGLE);
                recorder.record(
                    CycleSample::new(primary, secondary, input.timestamp_ms),
                    counter.is_down(),
                );
                let min_frames = counter.thresholds().minimum_cycle_frames;

                counter.update(primary, &snapshot).map(|rep| {
                    let cycle = recorder.complete();
                    let digest = analyze_cycle_with_floor(&cycle, min_frames).ok();
                    let feedback = digest.as_ref().map_or(FormFeedback::InsufficientData, |d| {
                        evaluate(d, &profile.feedback_policy())
                    });
                    SessionEvent::Rep(RepCompletion {
                        rep_number: rep.rep_number,
                        lowest_angle: rep.lowest_angle,
                        snapshot: rep.snapshot,
                        digest,
                        feedback,
                        dominant_issue: None,
                    })
                })
            }
            Tracker::Hold(timer) => timer.update(primary, input.timestamp_ms).map(|hold| {
                SessionEvent::Hold(HoldCompletion {
                    checkpoint: hold.checkpoint,
                    held_secs: hold.held_secs,
                    snapshot,
                    dominant_issue: None,
                })
            }),
        };

        let event = event.map(|event| self.close_segment(event));

        FrameOutcome {
            observed: true,
            warnings,
            event,
        }
    }

    /// Attach the rep's dominant warning, log it to history and start a
    /// fresh tally.
    fn close_segment(&mut self, mut event: SessionEvent) -> SessionEvent {
        let dominant = self.tally.dominant();
        self.tally.clear();

        let record = match &mut event {
            SessionEvent::Rep(rep) => {
                rep.dominant_issue = dominant;
                RepRecord {
                    number: rep.rep_number,
                    lowest_angle: Some(rep.lowest_angle),
                    feedback: Some(rep.feedback),
                    dominant_issue: dominant,
                    at_ms: rep.snapshot.timestamp_ms,
                }
            }
            SessionEvent::Hold(hold) => {
                hold.dominant_issue = dominant;
                RepRecord {
                    number: hold.checkpoint,
                    lowest_angle: None,
                    feedback: None,
                    dominant_issue: dominant,
                    at_ms: hold.snapshot.timestamp_ms,
                }
            }
        };
        self.history.push(record);
        event
    }

    fn has_required_parts(&self, landmarks: &LandmarkSet) -> bool {
        let min_visibility = self.config.min_visibility;
        self.profile.required_parts().iter().all(|&part| {
            Side::BOTH
                .iter()
                .any(|&side| landmarks.visible(Joint::on(side, part), min_visibility).is_some())
        })
    }

    // ---- controls ----

    /// Clear counters, history and tallies, keeping profile and recording flag.
    pub fn reset(&mut self) {
        self.tracker = Tracker::for_profile(self.profile);
        self.tally.clear();
        self.history.clear();
    }

    /// Switch exercise. Starts from scratch, recording off.
    pub fn set_profile(&mut self, profile: ExerciseProfile) {
        self.profile = profile;
        self.reset();
        self.is_recording = false;
        self.started_at = None;
    }

    /// Begin a recorded set from a clean slate.
    pub fn start_recording(&mut self) {
        self.reset();
        self.is_recording = true;
        self.started_at = Some(chrono::Utc::now());
    }

    /// End the recorded set and summarise it.
    pub fn stop_recording(&mut self) -> SessionSummary {
        self.is_recording = false;
        SessionSummary {
            profile: self.profile,
            reps: self.reps(),
            hold_secs: self.hold_secs(),
            history: self.history.clone(),
            started_at: self.started_at.take(),
            ended_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::landmarks::test_support::{blank_blazepose, place, squat_pose};
    use crate::landmarks::{BodyPart, Landmark, LandmarkLayout};

    fn planar_session(profile: ExerciseProfile) -> ExerciseSession {
        ExerciseSession::new(
            profile,
            SessionConfig {
                angle_space: AngleSpace::Planar,
                ..SessionConfig::default()
            },
        )
    }

    fn squat_frame(knee: f64, i: usize) -> FrameInput {
        FrameInput {
            landmarks: Some(squat_pose(knee)),
            timestamp_ms: i as f64 * 100.0,
            image: None,
        }
    }

    fn feed_squats(session: &mut ExerciseSession, knees: &[f64]) -> Vec<SessionEvent> {
        knees
            .iter()
            .enumerate()
            .filter_map(|(i, &knee)| session.process_frame(squat_frame(knee, i)).event)
            .collect()
    }

    fn plank_frame(hip_y: f64, t: f64) -> FrameInput {
        let mut points = blank_blazepose();
        for side in Side::BOTH {
            place(&mut points, Joint::on(side, BodyPart::Ear), Landmark::new(0.25, 0.48));
            place(&mut points, Joint::on(side, BodyPart::Shoulder), Landmark::new(0.3, 0.5));
            place(&mut points, Joint::on(side, BodyPart::Elbow), Landmark::new(0.31, 0.65));
            place(&mut points, Joint::on(side, BodyPart::Hip), Landmark::new(0.55, hip_y));
            place(&mut points, Joint::on(side, BodyPart::Ankle), Landmark::new(0.8, 0.6));
        }
        FrameInput {
            landmarks: Some(LandmarkSet::new(LandmarkLayout::BlazePose33, points).unwrap()),
            timestamp_ms: t,
            image: None,
        }
    }

    // -- process_frame: reps --------------------------------------------------

    #[test]
    fn squat_cycle_produces_one_analysed_rep() {
        let mut session = planar_session(ExerciseProfile::Squat);
        let events = feed_squats(
            &mut session,
            &[170.0, 170.0, 80.0, 70.0, 62.0, 90.0, 160.0, 170.0],
        );

        assert_eq!(session.reps(), 1);
        assert_eq!(events.len(), 1);
        let rep = assert_matches!(&events[0], SessionEvent::Rep(rep) => rep);
        assert_eq!(rep.rep_number, 1);
        assert!((rep.lowest_angle - 62.0).abs() < 1e-6);
        assert!((rep.snapshot.timestamp_ms - 400.0).abs() < 1e-9);

        let digest = rep.digest.expect("six frames is enough");
        assert_eq!(digest.frame_count, 6);
        assert_eq!(digest.descent_frames, 4);
        assert_eq!(digest.ascent_frames, 3);
        assert_eq!(rep.feedback, FormFeedback::Good);
        assert_eq!(rep.dominant_issue, None);

        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn short_cycle_reports_insufficient_data() {
        let mut session = planar_session(ExerciseProfile::Squat);
        let events = feed_squats(&mut session, &[170.0, 80.0, 170.0]);
        let rep = assert_matches!(&events[0], SessionEvent::Rep(rep) => rep);
        assert!(rep.digest.is_none());
        assert_eq!(rep.feedback, FormFeedback::InsufficientData);
        assert_eq!(session.reps(), 1);
    }

    #[test]
    fn dominant_warning_is_recorded_with_rep() {
        let mut session = planar_session(ExerciseProfile::Squat);
        // 50 degrees trips the too-deep warning on one frame.
        let events = feed_squats(
            &mut session,
            &[170.0, 150.0, 120.0, 90.0, 50.0, 90.0, 120.0, 160.0],
        );
        let rep = assert_matches!(&events[0], SessionEvent::Rep(rep) => rep);
        assert_eq!(rep.dominant_issue, Some(PostureIssue::TooDeep));
        assert_eq!(session.history()[0].dominant_issue, Some(PostureIssue::TooDeep));
    }

    #[test]
    fn missing_detection_is_skipped() {
        let mut session = planar_session(ExerciseProfile::Squat);
        feed_squats(&mut session, &[170.0, 80.0]);

        let outcome = session.process_frame(FrameInput {
            landmarks: None,
            timestamp_ms: 250.0,
            image: None,
        });
        assert!(!outcome.observed);
        assert!(outcome.event.is_none());

        let events = feed_squats(&mut session, &[170.0]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn invisible_legs_are_skipped() {
        let mut points = squat_pose(80.0).points().to_vec();
        for side in Side::BOTH {
            let index = LandmarkLayout::BlazePose33
                .index(Joint::on(side, BodyPart::Knee))
                .unwrap();
            points[index].visibility = Some(0.1);
        }
        let mut session = planar_session(ExerciseProfile::Squat);
        let outcome = session.process_frame(FrameInput {
            landmarks: Some(LandmarkSet::new(LandmarkLayout::BlazePose33, points).unwrap()),
            ..FrameInput::default()
        });
        assert!(!outcome.observed);
    }

    #[test]
    fn shoulder_press_counts_on_elbow_angle() {
        let mut session = planar_session(ExerciseProfile::ShoulderPress);
        // Arm joints borrow the leg geometry of a squat pose.
        let frame = |knee: f64, i: usize| {
            let legs = squat_pose(knee);
            let mut points = squat_pose(175.0).points().to_vec();
            for side in Side::BOTH {
                for (arm, leg) in [
                    (BodyPart::Shoulder, BodyPart::Hip),
                    (BodyPart::Elbow, BodyPart::Knee),
                    (BodyPart::Wrist, BodyPart::Ankle),
                ] {
                    let lm = *legs.get(Joint::on(side, leg)).unwrap();
                    place(&mut points, Joint::on(side, arm), lm);
                }
            }
            FrameInput {
                landmarks: Some(LandmarkSet::new(LandmarkLayout::BlazePose33, points).unwrap()),
                timestamp_ms: i as f64 * 100.0,
                image: None,
            }
        };

        let events: Vec<_> = [170.0, 140.0, 95.0, 90.0, 120.0, 155.0]
            .iter()
            .enumerate()
            .filter_map(|(i, &angle)| session.process_frame(frame(angle, i)).event)
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(session.reps(), 1);
    }

    // -- process_frame: holds -------------------------------------------------

    #[test]
    fn plank_hold_emits_checkpoint_after_ten_seconds() {
        let mut session = planar_session(ExerciseProfile::Plank);
        let mut events = Vec::new();
        for step in 0..=100 {
            if let Some(event) = session.process_frame(plank_frame(0.56, step as f64 * 100.0)).event {
                events.push(event);
            }
        }

        assert_eq!(events.len(), 1);
        let hold = assert_matches!(&events[0], SessionEvent::Hold(hold) => hold);
        assert_eq!(hold.checkpoint, 1);
        assert!((hold.held_secs - 10.0).abs() < 1e-9);
        assert_eq!(session.reps(), 1);
        assert!(session.hold_secs().is_some());
    }

    #[test]
    fn sagging_plank_reports_instant_warning() {
        let mut session = planar_session(ExerciseProfile::Plank);
        let outcome = session.process_frame(plank_frame(0.63, 0.0));
        assert!(outcome.observed);
        assert_eq!(outcome.warnings, vec![PostureIssue::HipsSagging]);
    }

    // -- controls -------------------------------------------------------------

    #[test]
    fn start_recording_resets_counts() {
        let mut session = planar_session(ExerciseProfile::Squat);
        feed_squats(&mut session, &[170.0, 80.0, 170.0]);
        assert_eq!(session.reps(), 1);

        session.start_recording();

        assert!(session.is_recording());
        assert_eq!(session.reps(), 0);
        assert!(session.history().is_empty());
    }

    #[test]
    fn stop_recording_summarises_history() {
        let mut session = planar_session(ExerciseProfile::Squat);
        session.start_recording();
        feed_squats(&mut session, &[170.0, 80.0, 170.0, 80.0, 170.0]);

        let summary = session.stop_recording();

        assert!(!session.is_recording());
        assert_eq!(summary.reps, 2);
        assert_eq!(summary.history.len(), 2);
        assert!(summary.started_at.is_some());
        assert_eq!(summary.hold_secs, None);
    }

    #[test]
    fn set_profile_switches_tracker() {
        let mut session = planar_session(ExerciseProfile::Squat);
        session.start_recording();
        feed_squats(&mut session, &[170.0, 80.0, 170.0]);

        session.set_profile(ExerciseProfile::Plank);

        assert_eq!(session.profile(), ExerciseProfile::Plank);
        assert_eq!(session.reps(), 0);
        assert_eq!(session.hold_secs(), Some(0.0));
        assert!(!session.is_recording());
    }
}
