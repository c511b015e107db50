//! Templated feedback used when the LLM is disabled, slow or failing.

use repcoach_core::posture::PostureIssue;
use repcoach_core::profile::ExerciseProfile;
use repcoach_core::session::{HoldCompletion, RepCompletion, SessionSummary};

use crate::prompt::capitalize;

pub const EMPTY_REPORT: &str = "No workout records yet. Record a set to get a report.";

pub const FRAME_CHECK_UNAVAILABLE: &str = "Could not check your form on that frame.";

pub const CHAT_UNAVAILABLE: &str =
    "Sorry, the trainer is unavailable right now. Please try again in a moment.";

/// One-line comment for a finished rep. A posture warning seen during the
/// rep takes precedence over the cycle verdict.
pub fn rep_feedback(profile: ExerciseProfile, rep: &RepCompletion) -> String {
    match rep.dominant_issue {
        Some(issue) => issue.message().to_string(),
        None => rep.feedback.message(profile),
    }
}

pub fn hold_feedback(hold: &HoldCompletion) -> String {
    match hold.dominant_issue {
        Some(issue) => format!("{:.0} s. {}", hold.held_secs, issue.message()),
        None => format!("{:.0} s held. Great line, keep going!", hold.held_secs),
    }
}

/// Plain-text report built from the rep history alone.
pub fn session_report(summary: &SessionSummary) -> String {
    if summary.history.is_empty() {
        return EMPTY_REPORT.to_string();
    }

    let profile = summary.profile;
    let headline = match summary.hold_secs {
        Some(secs) => format!(
            "{} session: held {:.0} s in total.",
            capitalize(profile.display_name()),
            secs
        ),
        None => format!(
            "{} session: {} {}.",
            capitalize(profile.display_name()),
            summary.reps,
            if summary.reps == 1 { "rep" } else { "reps" }
        ),
    };

    let clean = summary
        .history
        .iter()
        .filter(|r| r.dominant_issue.is_none() && !r.feedback.is_some_and(|f| f.is_problem()))
        .count();

    let mut counts: Vec<(PostureIssue, usize)> = Vec::new();
    for issue in summary.history.iter().filter_map(|r| r.dominant_issue) {
        match counts.iter_mut().find(|(seen, _)| *seen == issue) {
            Some((_, n)) => *n += 1,
            None => counts.push((issue, 1)),
        }
    }
    // Stable sort keeps first-seen order on ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut report = format!("{headline} {clean} of {} with clean form.", summary.history.len());
    if let Some((issue, n)) = counts.first() {
        report.push_str(&format!(
            " Most common issue: {} ({} of {}). {}",
            issue.label(),
            n,
            summary.history.len(),
            issue.message()
        ));
    }
    report
}
