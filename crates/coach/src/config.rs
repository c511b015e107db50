use std::time::Duration;

use repcoach_core::text::FEEDBACK_CHAR_LIMIT;

/// LLM coaching configuration loaded from environment variables.
#[derive(Clone)]
pub struct CoachConfig {
    /// Bearer token. Coaching is disabled when absent.
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Model for per-rep comments.
    pub coach_model: String,
    /// Model for end-of-session reports.
    pub report_model: String,
    /// Upper bound on a single LLM call.
    pub timeout_secs: u64,
    /// Token cap for per-rep comments.
    pub max_tokens: u32,
    /// On-screen length of a per-rep comment, in characters.
    pub char_limit: usize,
}

impl CoachConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                     |
    /// |----------------------|-----------------------------|
    /// | `OPENAI_API_KEY`     | unset (coaching disabled)   |
    /// | `OPENAI_BASE_URL`    | `https://api.openai.com/v1` |
    /// | `COACH_MODEL`        | `gpt-4o-mini`               |
    /// | `REPORT_MODEL`       | `gpt-4o`                    |
    /// | `COACH_TIMEOUT_SECS` | `15`                        |
    /// | `COACH_MAX_TOKENS`   | `100`                       |
    /// | `COACH_CHAR_LIMIT`   | `28`                        |
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into())
            .trim_end_matches('/')
            .to_string();

        let coach_model = std::env::var("COACH_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        let report_model = std::env::var("REPORT_MODEL").unwrap_or_else(|_| "gpt-4o".into());

        let timeout_secs: u64 = std::env::var("COACH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("COACH_TIMEOUT_SECS must be a valid u64");

        let max_tokens: u32 = std::env::var("COACH_MAX_TOKENS")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("COACH_MAX_TOKENS must be a valid u32");

        let char_limit: usize = std::env::var("COACH_CHAR_LIMIT")
            .unwrap_or_else(|_| FEEDBACK_CHAR_LIMIT.to_string())
            .parse()
            .expect("COACH_CHAR_LIMIT must be a valid usize");

        Self {
            api_key,
            base_url,
            coach_model,
            report_model,
            timeout_secs,
            max_tokens,
            char_limit,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            coach_model: "gpt-4o-mini".into(),
            report_model: "gpt-4o".into(),
            timeout_secs: 15,
            max_tokens: 100,
            char_limit: FEEDBACK_CHAR_LIMIT,
        }
    }
}

// Hand-written so the key never lands in logs.
impl std::fmt::Debug for CoachConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoachConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("coach_model", &self.coach_model)
            .field("report_model", &self.report_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("char_limit", &self.char_limit)
            .finish()
    }
}
