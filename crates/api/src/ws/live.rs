//! Per-connection session driver.
//!
//! [`LiveSession`] glues an [`ExerciseSession`] to the coach: it feeds
//! frames through the rep engine, fires a coaching request on every rep or
//! hold checkpoint, and renders the `FEEDBACK` frame the client sees. It
//! knows nothing about sockets, so it is driven directly in tests.

use std::sync::Arc;
use std::time::Instant;

use repcoach_coach::{fallback, prompt, CoachConfig, CoachDispatcher, LlmClient};
use repcoach_core::profile::ExerciseProfile;
use repcoach_core::session::{
    ExerciseSession, FrameInput, SessionConfig, SessionEvent, SessionSummary,
};

use crate::ws::protocol::{FeedbackFrame, ServerMessage};

/// Shown while the body is not (fully) in the frame.
pub const NOT_DETECTED_MESSAGE: &str = "Step back so your whole body is in view.";

pub struct LiveSession {
    session: ExerciseSession,
    /// `None` when coaching is disabled; templated comments are used instead.
    coach: Option<CoachDispatcher>,
    local_comment: Option<String>,
    instant: String,
    last_verdict: String,
    opened_at: Instant,
}

impl LiveSession {
    pub fn new(
        profile: ExerciseProfile,
        config: SessionConfig,
        coach: Option<CoachDispatcher>,
    ) -> Self {
        Self {
            session: ExerciseSession::new(profile, config),
            coach,
            local_comment: None,
            instant: String::new(),
            last_verdict: String::new(),
            opened_at: Instant::now(),
        }
    }

    pub fn session(&self) -> &ExerciseSession {
        &self.session
    }

    /// Milliseconds since the connection opened; the clock for frames that
    /// carry no timestamp of their own.
    pub fn elapsed_ms(&self) -> f64 {
        self.opened_at.elapsed().as_secs_f64() * 1000.0
    }

    /// Run one frame and return the feedback frame for it.
    pub fn handle_frame(&mut self, input: FrameInput) -> ServerMessage {
        let outcome = self.session.process_frame(input);

        if let Some(event) = outcome.event {
            self.on_event(event);
        }

        self.instant = if !outcome.observed {
            NOT_DETECTED_MESSAGE.to_string()
        } else if !outcome.warnings.is_empty() {
            outcome
                .warnings
                .iter()
                .map(|issue| issue.message())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            self.last_verdict.clone()
        };

        self.feedback()
    }

    fn on_event(&mut self, event: SessionEvent) {
        let profile = self.session.profile();
        let (number, request, comment) = match &event {
            SessionEvent::Rep(rep) => {
                self.last_verdict = rep.feedback.message(profile);
                tracing::info!(
                    rep = rep.rep_number,
                    exercise = %profile,
                    lowest_angle = rep.lowest_angle,
                    feedback = ?rep.feedback,
                    "Rep completed",
                );
                (
                    rep.rep_number,
                    prompt::rep_prompt(profile, rep),
                    fallback::rep_feedback(profile, rep),
                )
            }
            SessionEvent::Hold(hold) => {
                self.last_verdict = fallback::hold_feedback(hold);
                tracing::info!(
                    checkpoint = hold.checkpoint,
                    exercise = %profile,
                    held_secs = hold.held_secs,
                    "Hold checkpoint reached",
                );
                (
                    hold.checkpoint,
                    prompt::hold_prompt(profile, hold),
                    fallback::hold_feedback(hold),
                )
            }
        };

        match &self.coach {
            Some(coach) => {
                coach.dispatch(number, request, comment);
            }
            None => self.local_comment = Some(comment),
        }
    }

    /// Current state as a `FEEDBACK` frame.
    pub fn feedback(&self) -> ServerMessage {
        let coach_feedback = match &self.coach {
            Some(coach) => coach.latest().map(|c| c.text),
            None => self.local_comment.clone(),
        };

        ServerMessage::Feedback(FeedbackFrame {
            reps: self.session.reps(),
            instant_feedback: self.instant.clone(),
            coach_feedback: coach_feedback.unwrap_or_default(),
            is_recording: self.session.is_recording(),
            exercise: self.session.profile(),
            hold_secs: self.session.hold_secs(),
        })
    }

    // ---- controls ----

    pub fn start_recording(&mut self) {
        self.session.start_recording();
        self.clear_feedback();
        tracing::info!(exercise = %self.session.profile(), "Recording started");
    }

    pub fn stop_recording(&mut self) -> SessionSummary {
        let summary = self.session.stop_recording();
        tracing::info!(
            exercise = %summary.profile,
            reps = summary.reps,
            "Recording stopped",
        );
        summary
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.clear_feedback();
    }

    pub fn set_exercise(&mut self, profile: ExerciseProfile) {
        self.session.set_profile(profile);
        self.clear_feedback();
        tracing::info!(exercise = %profile, "Exercise changed");
    }

    fn clear_feedback(&mut self) {
        if let Some(coach) = &self.coach {
            coach.clear();
        }
        self.local_comment = None;
        self.instant.clear();
        self.last_verdict.clear();
    }
}

/// Per-connection dispatcher, when coaching is enabled.
pub fn coach_dispatcher(
    client: Option<&Arc<dyn LlmClient>>,
    config: &CoachConfig,
) -> Option<CoachDispatcher> {
    client.map(|client| {
        CoachDispatcher::new(Arc::clone(client), config.timeout(), config.char_limit)
    })
}
