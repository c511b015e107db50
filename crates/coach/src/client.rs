//! Chat-completions client.
//!
//! [`LlmClient`] is the seam the dispatcher and the HTTP handlers depend on;
//! [`OpenAiClient`] implements it against any OpenAI-compatible
//! `/chat/completions` endpoint using [`reqwest`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CoachConfig;
use crate::error::CoachError;
use crate::prompt::{CoachPrompt, PromptKind};

/// Token cap for trainer Q&A answers.
pub const CHAT_MAX_TOKENS: u32 = 200;

/// Something that turns a prompt into a reply.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &CoachPrompt) -> Result<String, CoachError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, trimmed. Empty or missing text is an error.
    pub(crate) fn into_text(self) -> Result<String, CoachError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CoachError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible chat completions API.
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    coach_model: String,
    report_model: String,
    max_tokens: u32,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("coach_model", &self.coach_model)
            .field("report_model", &self.report_model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`CoachError::MissingCredential`] when no API key is set.
    /// The request timeout is enforced by the caller, not here.
    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Build a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &CoachConfig) -> Result<Self, CoachError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(CoachError::MissingCredential)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            coach_model: config.coach_model.clone(),
            report_model: config.report_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub(crate) fn build_request<'a>(&'a self, prompt: &'a CoachPrompt) -> ChatRequest<'a> {
        let (model, max_tokens) = match prompt.kind {
            PromptKind::Coach => (self.coach_model.as_str(), Some(self.max_tokens)),
            PromptKind::Chat => (self.coach_model.as_str(), Some(CHAT_MAX_TOKENS)),
            PromptKind::Report => (self.report_model.as_str(), None),
        };

        let user_content = match prompt.image.as_deref() {
            Some(url) => MessageContent::Parts(vec![
                ContentPart::Text { text: &prompt.text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url, detail: "low" },
                },
            ]),
            None => MessageContent::Text(&prompt.text),
        };

        ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(&prompt.system),
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            max_tokens,
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`CoachError::Api`] containing
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CoachError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CoachError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CoachError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &CoachPrompt) -> Result<String, CoachError> {
        let request = self.build_request(prompt);
        tracing::debug!(
            model = request.model,
            kind = ?prompt.kind,
            has_image = prompt.image.is_some(),
            "Sending chat completion request",
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        Self::parse_response::<ChatResponse>(response)
            .await?
            .into_text()
    }
}
