use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body missing, not JSON, or missing a required field.
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Text generation failed: {0}")]
    UpstreamText(anyhow::Error),

    #[error("Speech synthesis failed: {0}")]
    UpstreamAudio(anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InvalidBody(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::UpstreamText(e) => {
                tracing::error!("Text generation error: {:#}", e);
                (StatusCode::BAD_GATEWAY, "Text generation failed".to_string())
            }
            ApiError::UpstreamAudio(e) => {
                tracing::error!("Speech synthesis error: {:#}", e);
                (StatusCode::BAD_GATEWAY, "Speech synthesis failed".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
