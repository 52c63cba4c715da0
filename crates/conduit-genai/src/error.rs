use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use conduit_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenAiError>;

/// Generative backend errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum GenAiError {
    /// Invalid request parameters
    #[error("{0}")]
    InvalidRequest(String),

    /// Backend returned a non-2xx status
    #[error("backend returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend answered but produced nothing usable
    #[error("backend returned an empty response: {0}")]
    EmptyResponse(String),

    /// Network or connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Streaming failed after the response started
    #[error("stream error: {0}")]
    Streaming(String),

    /// Video operation did not finish in time
    #[error("video generation did not finish within {}s", .0.as_secs())]
    VideoTimeout(Duration),

    /// Video operation finished with an error
    #[error("video generation failed: {0}")]
    OperationFailed(String),

    /// Image referenced by a describe request could not be fetched
    #[error("failed to fetch image: {0}")]
    ImageFetch(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error; details are logged, never returned
    #[error("internal error: {0}")]
    Internal(String),
}

impl GenAiError {
    /// Map a backend HTTP status to an error, keeping client-caused statuses
    pub fn upstream(status: u16, body: &str) -> Self {
        Self::Upstream {
            status,
            message: upstream_message(body),
        }
    }
}

/// Pull `error.message` out of a Google error body, falling back to the raw text
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.pointer("/error/message")?.as_str().map(str::to_owned))
        .unwrap_or_else(|| body.trim().to_owned())
}

impl HttpError for GenAiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => match *status {
                400 => StatusCode::BAD_REQUEST,
                429 => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::EmptyResponse(_)
            | Self::Connection(_)
            | Self::Streaming(_)
            | Self::OperationFailed(_)
            | Self::ImageFetch(_) => StatusCode::BAD_GATEWAY,
            Self::VideoTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Upstream { .. }
            | Self::EmptyResponse(_)
            | Self::Connection(_)
            | Self::Streaming(_)
            | Self::OperationFailed(_)
            | Self::ImageFetch(_) => "upstream_error",
            Self::VideoTimeout(_) => "timeout_error",
            Self::Config(_) | Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Config(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for GenAiError {
    fn into_response(self) -> Response {
        conduit_core::error_response(&self)
    }
}
