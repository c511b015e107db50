//! Prompt construction.
//!
//! Prompts carry the numeric cycle digest and the lowest-point metrics as
//! plain text, plus the lowest-point camera frame when one is available.

use std::fmt::Write as _;
use std::sync::Arc;

use repcoach_core::cycle::CycleDigest;
use repcoach_core::metrics::{AngleKind, FrameMetrics};
use repcoach_core::posture::PostureIssue;
use repcoach_core::profile::ExerciseProfile;
use repcoach_core::session::{HoldCompletion, RepCompletion, SessionSummary};

/// Which model tier and token budget a prompt is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// One-line per-rep comment.
    Coach,
    /// End-of-session report.
    Report,
    /// Free-form trainer Q&A.
    Chat,
}

#[derive(Debug, Clone)]
pub struct CoachPrompt {
    pub kind: PromptKind,
    pub system: String,
    pub text: String,
    /// Camera frame as a data URL.
    pub image: Option<Arc<str>>,
}

const REPORT_SYSTEM_PROMPT: &str = "You are a professional personal trainer. \
Summarise the session for the user: what went well, the most common mistake, \
and one concrete thing to practise next time. Keep it under 120 words.";

const CHAT_SYSTEM_PROMPT: &str = "You are a fitness trainer AI. Answer questions \
about exercise technique, form, diet and training plans kindly. You specialise in \
squats, planks and shoulder presses. Answer concisely in 2-3 sentences.";

fn form_criteria(profile: ExerciseProfile) -> &'static str {
    match profile {
        ExerciseProfile::Squat => {
            "Squat form criteria:\n\
             1. Depth: a minimum knee angle of 60-90 degrees is a proper squat.\n\
             2. Torso: an average torso angle of 70-100 degrees is good (not bent over, not rigidly upright).\n\
             3. Tempo: descent and ascent should take a similar number of frames (no dropping or bouncing)."
        }
        ExerciseProfile::ShoulderPress => {
            "Shoulder press form criteria:\n\
             1. Range: the elbow angle should go from about 90 degrees at the bottom to 160+ degrees at lockout.\n\
             2. Elbows: slightly in front of the body, not flared straight out.\n\
             3. Back: ribs down, no arching of the lower back."
        }
        ExerciseProfile::Plank => {
            "Plank form criteria:\n\
             1. Body line: the shoulder-hip-ankle angle should stay between 160 and 180 degrees.\n\
             2. Hips: neither piked up nor sagging towards the floor.\n\
             3. Elbows directly under the shoulders, neck neutral."
        }
    }
}

fn coach_system_prompt(profile: ExerciseProfile) -> String {
    format!(
        "You are an exercise form analyst.\n\n{}\n\n\
         Output rules:\n\
         - If there is a problem, give one very short, direct correction (about 10 words).\n\
         - If the form is good overall, reply exactly \"Good {}!\"",
        form_criteria(profile),
        profile.display_name(),
    )
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Per-rep coaching prompt.
pub fn rep_prompt(profile: ExerciseProfile, rep: &RepCompletion) -> CoachPrompt {
    let primary = profile.primary_angle().label();
    let mut text = format!("{} rep {}.\n", capitalize(profile.display_name()), rep.rep_number);

    match &rep.digest {
        Some(digest) => write_digest(&mut text, primary, digest),
        None => {
            let _ = writeln!(text, "Cycle too short to analyse.");
        }
    }
    let _ = writeln!(text, "Lowest {primary} angle: {:.1} deg", rep.lowest_angle);
    write_lowest_point(&mut text, &rep.snapshot.metrics);
    let _ = writeln!(text, "Rule check: {}", rep.feedback.message(profile));
    write_dominant(&mut text, rep.dominant_issue);

    CoachPrompt {
        kind: PromptKind::Coach,
        system: coach_system_prompt(profile),
        text,
        image: rep.snapshot.image.clone(),
    }
}

/// Hold-checkpoint prompt for timed exercises.
pub fn hold_prompt(profile: ExerciseProfile, hold: &HoldCompletion) -> CoachPrompt {
    let mut text = format!(
        "{} held for {:.0} s (checkpoint {}).\n",
        capitalize(profile.display_name()),
        hold.held_secs,
        hold.checkpoint,
    );
    let line = hold.snapshot.metrics.angle(AngleKind::BodyLine);
    let _ = writeln!(
        text,
        "Body line angle L/R: {} / {}",
        fmt_angle(line.left),
        fmt_angle(line.right)
    );
    write_dominant(&mut text, hold.dominant_issue);

    CoachPrompt {
        kind: PromptKind::Coach,
        system: coach_system_prompt(profile),
        text,
        image: hold.snapshot.image.clone(),
    }
}

/// Coaching prompt for one still frame sent outside a live session.
///
/// Timed exercises are described by how long the hold has lasted, rep
/// exercises by the rep the frame belongs to.
pub fn frame_prompt(
    profile: ExerciseProfile,
    rep_count: u32,
    hold_secs: Option<f64>,
    image_data_url: &str,
) -> CoachPrompt {
    let name = capitalize(profile.display_name());
    let text = if profile.is_timed() {
        format!("{name} form, held for {:.0} s so far.", hold_secs.unwrap_or(0.0))
    } else {
        format!("{name} form at rep {rep_count}.")
    };

    CoachPrompt {
        kind: PromptKind::Coach,
        system: coach_system_prompt(profile),
        text,
        image: Some(Arc::from(image_data_url)),
    }
}

/// End-of-session report prompt. `None` when there is nothing to report on.
pub fn report_prompt(summary: &SessionSummary) -> Option<CoachPrompt> {
    if summary.history.is_empty() {
        return None;
    }

    let profile = summary.profile;
    let mut text = match summary.hold_secs {
        Some(secs) => format!(
            "The user finished a {} session holding for {:.0} s in total.\n",
            profile.display_name(),
            secs
        ),
        None => format!(
            "The user finished a {} session with {} reps.\n",
            profile.display_name(),
            summary.reps
        ),
    };
    let _ = writeln!(text, "Per-rep log:");
    for record in &summary.history {
        let _ = write!(text, "Rep {}:", record.number);
        if let Some(angle) = record.lowest_angle {
            let _ = write!(text, " lowest {angle:.0} deg,");
        }
        if let Some(feedback) = &record.feedback {
            let _ = write!(text, " {}", feedback.message(profile));
        }
        match record.dominant_issue {
            Some(issue) => {
                let _ = writeln!(text, " (frequent warning: {})", issue.label());
            }
            None => {
                let _ = writeln!(text, " (no warnings)");
            }
        }
    }
    let _ = writeln!(
        text,
        "Write a short overall report with strengths and what to improve."
    );

    Some(CoachPrompt {
        kind: PromptKind::Report,
        system: REPORT_SYSTEM_PROMPT.to_string(),
        text,
        image: None,
    })
}

pub fn chat_prompt(message: &str) -> CoachPrompt {
    CoachPrompt {
        kind: PromptKind::Chat,
        system: CHAT_SYSTEM_PROMPT.to_string(),
        text: message.trim().to_string(),
        image: None,
    }
}

// ---- private helpers ----

fn write_digest(text: &mut String, primary: &str, digest: &CycleDigest) {
    let _ = writeln!(
        text,
        "Cycle: {} frames over {:.2} s",
        digest.frame_count, digest.duration_sec
    );
    let _ = writeln!(
        text,
        "{primary} min/max: {:.1} / {:.1} deg (range {:.1})",
        digest.knee_min, digest.knee_max, digest.knee_range
    );
    let _ = writeln!(
        text,
        "Torso avg: {:.1} deg (min {:.1}, max {:.1}, range {:.1})",
        digest.torso_avg, digest.torso_min, digest.torso_max, digest.torso_range
    );
    let _ = writeln!(
        text,
        "Descent/ascent frames: {} / {}",
        digest.descent_frames, digest.ascent_frames
    );
}

fn write_lowest_point(text: &mut String, metrics: &FrameMetrics) {
    let _ = writeln!(
        text,
        "At the lowest point: knee L/R {} / {}, torso L/R {} / {}",
        fmt_angle(metrics.knee.left),
        fmt_angle(metrics.knee.right),
        fmt_angle(metrics.torso.left),
        fmt_angle(metrics.torso.right),
    );
    if let Some(depth_ok) = metrics.depth_ok {
        let _ = writeln!(text, "Hips below knees: {}", yes_no(depth_ok));
    }
    if let (Some(left), Some(right)) = (metrics.knee_align_left, metrics.knee_align_right) {
        let _ = writeln!(text, "Knee-over-toe offset L/R: {left:.3} / {right:.3}");
    }
    if let (Some(left), Some(right)) = (metrics.heel_grounded_left, metrics.heel_grounded_right) {
        let _ = writeln!(text, "Heels grounded L/R: {} / {}", yes_no(left), yes_no(right));
    }
}

fn write_dominant(text: &mut String, issue: Option<PostureIssue>) {
    if let Some(issue) = issue {
        let _ = writeln!(text, "Most frequent warning: {}", issue.label());
    }
}

fn fmt_angle(angle: f64) -> String {
    if repcoach_core::angle::is_observed(angle) {
        format!("{angle:.1}")
    } else {
        "n/a".to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
