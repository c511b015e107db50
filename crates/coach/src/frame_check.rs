//! One-off form check of a single camera frame.

use std::time::Duration;

use repcoach_core::profile::ExerciseProfile;
use repcoach_core::text::shorten_feedback;

use crate::client::LlmClient;
use crate::dispatcher::request;
use crate::fallback::FRAME_CHECK_UNAVAILABLE;
use crate::prompt::frame_prompt;

/// A still frame and where in the set it was taken.
#[derive(Debug, Clone)]
pub struct FrameCheck {
    pub profile: ExerciseProfile,
    pub rep_count: u32,
    pub hold_secs: Option<f64>,
    /// Camera frame as a data URL.
    pub image: String,
}

/// Short on-screen comment for one frame.
///
/// Without a client, or when the call fails or comes back blank, the fixed
/// fallback line is returned.
pub async fn frame_feedback(
    client: Option<&dyn LlmClient>,
    check: &FrameCheck,
    timeout: Duration,
    char_limit: usize,
) -> String {
    let Some(client) = client else {
        return FRAME_CHECK_UNAVAILABLE.to_string();
    };

    let prompt = frame_prompt(check.profile, check.rep_count, check.hold_secs, &check.image);
    match request(client, &prompt, timeout).await {
        Ok(reply) => {
            let text = shorten_feedback(&reply, char_limit);
            if text.is_empty() {
                FRAME_CHECK_UNAVAILABLE.to_string()
            } else {
                text
            }
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                exercise = check.profile.slug(),
                "Frame check failed, using fallback",
            );
            FRAME_CHECK_UNAVAILABLE.to_string()
        }
    }
}
