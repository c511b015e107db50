//! End-of-session report.

use std::time::Duration;

use repcoach_core::session::SessionSummary;

use crate::client::LlmClient;
use crate::dispatcher::request;
use crate::fallback;
use crate::prompt::report_prompt;

/// Report text for a finished set.
///
/// Sessions without history get a fixed message and no LLM call. Without a
/// client, or when the call fails, the templated report is returned.
pub async fn session_report(
    client: Option<&dyn LlmClient>,
    summary: &SessionSummary,
    timeout: Duration,
) -> String {
    let Some(prompt) = report_prompt(summary) else {
        return fallback::EMPTY_REPORT.to_string();
    };
    let Some(client) = client else {
        return fallback::session_report(summary);
    };

    match request(client, &prompt, timeout).await {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(
                error = %e,
                reps = summary.reps,
                "Report generation failed, using template",
            );
            fallback::session_report(summary)
        }
    }
}
