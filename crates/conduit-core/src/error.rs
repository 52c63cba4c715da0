use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type; their `IntoResponse`
/// impls delegate to [`error_response`].
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error type (e.g. `invalid_request_error`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    fn client_message(&self) -> String;
}

/// Flat error body, `{"error": "..."}`
///
/// Bot-side callers decode a single `error` string field, so the body
/// stays flat instead of nesting type and code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// Render a domain error as a status code plus flat JSON body
pub fn error_response<E: HttpError + ?Sized>(error: &E) -> Response {
    let status = error.status_code();

    if status.is_server_error() {
        tracing::warn!(error_type = error.error_type(), error = %error, "request failed");
    }

    (status, Json(ErrorBody::new(error.client_message()))).into_response()
}
