use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use repcoach_core::error::CoreError;
use serde::Serialize;

/// Error returned by HTTP handlers.
///
/// Every variant renders as `{"error": <message>, "code": <CODE>}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Malformed or out-of-range request input.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(CoreError::Validation(_)) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Core(CoreError::UnknownExercise(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_EXERCISE")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Core(CoreError::Validation(msg)) | AppError::BadRequest(msg) => msg.clone(),
            AppError::Core(CoreError::UnknownExercise(name)) => {
                format!("Unknown exercise '{name}'")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Request rejected");

        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: self.client_message(),
            code,
        };
        (status, Json(body)).into_response()
    }
}
