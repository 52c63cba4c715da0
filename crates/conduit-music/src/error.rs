use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use conduit_core::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MusicError>;

/// Music lookup and playback errors
#[derive(Debug, Error)]
pub enum MusicError {
    /// Invalid request parameters
    #[error("{0}")]
    InvalidRequest(String),

    /// Extractor process failed
    #[error("extractor failed: {0}")]
    Extractor(String),

    /// Extractor succeeded but gave no playable stream
    #[error("no playable stream found for '{0}'")]
    NoStream(String),

    /// Skip on a guild with nothing playing
    #[error("Not playing anything")]
    NotPlaying,

    /// No voice backend configured
    #[error("voice playback is not configured")]
    VoiceUnavailable,

    /// Voice backend failed to join, play or leave
    #[error("voice error: {0}")]
    Voice(String),

    /// Guild session task is gone
    #[error("playback session closed")]
    SessionClosed,
}

impl HttpError for MusicError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::NotPlaying => StatusCode::BAD_REQUEST,
            Self::Extractor(_) | Self::NoStream(_) | Self::Voice(_) => StatusCode::BAD_GATEWAY,
            Self::VoiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::SessionClosed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) | Self::NotPlaying => "invalid_request_error",
            Self::Extractor(_) | Self::NoStream(_) => "extractor_error",
            Self::Voice(_) | Self::VoiceUnavailable => "voice_error",
            Self::SessionClosed => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::SessionClosed => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for MusicError {
    fn into_response(self) -> Response {
        conduit_core::error_response(&self)
    }
}
