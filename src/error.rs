use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Opaque message returned to clients when the LLM provider fails
pub const UPSTREAM_ERROR_MESSAGE: &str = "Upstream LLM error";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client input violates the declared constraints
    #[error("Validation error: {0}")]
    Validation(String),
    /// Configuration error (e.g. missing LLM credential)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Upstream API answered with a non-success status
    #[error("Upstream error ({status}): {message}")]
    UpstreamError { status: StatusCode, message: String },
    /// HTTP request error (connect, timeout, decode)
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
    /// Internal server error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Status code and client-facing message.
    ///
    /// Provider and internal details stay in the logs; only validation
    /// messages are echoed back since they describe the caller's own input.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "LLM not configured".to_string(),
            ),
            Self::UpstreamError { .. } | Self::HttpRequest(_) => {
                (StatusCode::BAD_GATEWAY, UPSTREAM_ERROR_MESSAGE.to_string())
            }
            Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type_name(&self),
            }
        }));

        (status, body).into_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::Validation(_) => "validation_error",
        AppError::ConfigError(_) => "config_error",
        AppError::UpstreamError { .. } => "upstream_error",
        AppError::HttpRequest(_) => "upstream_error",
        AppError::InternalError(_) => "internal_error",
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}
