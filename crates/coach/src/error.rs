/// Errors from the LLM boundary.
///
/// None of these reach the frame loop; callers log them and substitute a
/// templated fallback.
#[derive(Debug, thiserror::Error)]
pub enum CoachError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("LLM API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A well-formed reply without any text in it.
    #[error("LLM returned an empty response")]
    EmptyResponse,

    /// No API key is configured.
    #[error("LLM credential is not configured")]
    MissingCredential,

    #[error("LLM request timed out after {0:?}")]
    Timeout(std::time::Duration),
}
