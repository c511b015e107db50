//! Trainer Q&A.

use std::time::Duration;

use crate::client::LlmClient;
use crate::dispatcher::request;
use crate::error::CoachError;
use crate::prompt::chat_prompt;

/// Ask the trainer a question. The caller rejects blank messages before
/// getting here.
pub async fn trainer_reply(
    client: &dyn LlmClient,
    message: &str,
    timeout: Duration,
) -> Result<String, CoachError> {
    let prompt = chat_prompt(message);
    tracing::debug!(chars = prompt.text.chars().count(), "Trainer question");
    request(client, &prompt, timeout).await
}
