//! Quiz generation: backend prompt, draft parsing and answer shuffling

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod draft;
mod error;
mod normalize;
mod prompt;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use conduit_core::{HttpError, JsonPayload};
use conduit_genai::{GenAiError, Provider};
use serde::Deserialize;

pub use draft::{QuizDraft, parse_draft, strip_code_fence};
pub use error::QuizError;
pub use normalize::{QuizRecord, normalize};
pub use prompt::build_prompt;

/// Shared state for the quiz endpoint
pub struct QuizState {
    provider: Arc<dyn Provider>,
    max_history: usize,
}

impl QuizState {
    pub fn new(provider: Arc<dyn Provider>, max_history: usize) -> Self {
        Self { provider, max_history }
    }
}

/// Build quiz state on top of an existing generative provider
pub fn build_state(config: &conduit_config::Config, provider: Arc<dyn Provider>) -> Arc<QuizState> {
    tracing::debug!(max_history = config.quiz.max_history, "quiz endpoint enabled");
    Arc::new(QuizState::new(provider, config.quiz.max_history))
}

/// Create the endpoint router for quiz generation
pub fn endpoint_router() -> Router<Arc<QuizState>> {
    Router::new().route("/generate-quiz", post(generate_quiz_handler))
}

/// Body of `/generate-quiz`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub topic: Option<String>,
    /// Previously asked questions, most recent first
    #[serde(default)]
    pub history: Option<Vec<String>>,
}

/// Errors from the quiz endpoint
#[derive(Debug, thiserror::Error)]
pub enum GenerateQuizError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Backend(#[from] GenAiError),
}

impl HttpError for GenerateQuizError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            // The backend broke its contract, not the client
            Self::Quiz(_) | Self::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Quiz(QuizError::MalformedOutput(_)) => "malformed_output",
            Self::Quiz(QuizError::Validation(_)) => "validation_error",
            Self::Backend(_) => "upstream_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Backend(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for GenerateQuizError {
    fn into_response(self) -> Response {
        conduit_core::error_response(&self)
    }
}

/// Ask the backend for a quiz on `topic` and normalize the answer
///
/// One backend call, no retry.
pub async fn generate_quiz(
    provider: &dyn Provider,
    topic: &str,
    history: &[String],
    max_history: usize,
) -> Result<QuizRecord, GenerateQuizError> {
    let prompt = build_prompt(topic, history, max_history);

    let text = provider.generate_text(&prompt).await?;

    let draft = parse_draft(&text).inspect_err(|e| {
        tracing::warn!(topic, error = %e, "backend quiz output could not be parsed");
    })?;

    let record = normalize(draft, &mut rand::rng())?;

    Ok(record)
}

async fn generate_quiz_handler(
    State(state): State<Arc<QuizState>>,
    JsonPayload(request): JsonPayload<QuizRequest>,
) -> Result<Json<QuizRecord>, GenerateQuizError> {
    let topic = request
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .ok_or_else(|| GenerateQuizError::InvalidRequest("topic is required".to_string()))?;

    let history = request.history.unwrap_or_default();

    tracing::debug!(topic, history = history.len(), "quiz handler called");

    let record = generate_quiz(state.provider.as_ref(), topic, &history, state.max_history).await?;

    tracing::debug!(options = record.options.len(), "quiz generated");

    Ok(Json(record))
}
