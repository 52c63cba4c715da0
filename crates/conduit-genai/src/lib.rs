#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod artifacts;
mod error;
mod protocol;
mod provider;
mod server;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
};
use conduit_core::JsonPayload;
use futures_util::StreamExt;
use tower_http::services::ServeDir;

pub use artifacts::{Artifact, ArtifactKind, ArtifactStore};
pub use error::{GenAiError, Result};
pub use provider::{InlineImage, Provider, TextStream, google::GoogleProvider};
pub use server::Server;
pub use types::{
    DescribeImageRequest, ImageRequest, ImageResponse, PromptRequest, TextResponse, VideoResponse,
};

use types::{DEFAULT_DESCRIBE_PROMPT, non_blank};

/// Build the generative server from configuration
///
/// # Errors
///
/// Returns an error if the provider cannot be configured or the artifact
/// directories cannot be created
pub fn build_server(config: &conduit_config::Config) -> anyhow::Result<Arc<Server>> {
    let provider = GoogleProvider::new(&config.genai)
        .map_err(|e| anyhow::anyhow!("Failed to initialize generative provider: {e}"))?;
    let store = ArtifactStore::open(&config.artifacts)?;
    let fetcher = reqwest::Client::builder()
        .timeout(config.genai.request_timeout()?)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build image fetch client: {e}"))?;

    tracing::debug!(
        provider = provider.name(),
        text_model = %config.genai.text_model,
        "generative server initialized"
    );

    Ok(Arc::new(Server::new(Arc::new(provider), store, fetcher)))
}

/// Create the endpoint router for generative requests
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/generate-text", post(generate_text))
        .route("/generate-text-stream", post(generate_text_stream))
        .route("/generate-image", post(generate_image))
        .route("/generate-video", post(generate_video))
        .route("/describe-image", post(describe_image))
}

/// Serve saved images under `/images` and videos under `/videos`
pub fn artifact_router<S: Clone + Send + Sync + 'static>(store: &ArtifactStore) -> Router<S> {
    Router::new()
        .nest_service(
            &format!("/{}", ArtifactKind::Image.route()),
            ServeDir::new(store.dir(ArtifactKind::Image)),
        )
        .nest_service(
            &format!("/{}", ArtifactKind::Video.route()),
            ServeDir::new(store.dir(ArtifactKind::Video)),
        )
}

fn require_prompt(prompt: Option<&str>) -> Result<&str> {
    non_blank(prompt).ok_or_else(|| GenAiError::InvalidRequest("prompt is required".to_string()))
}

async fn generate_text(
    State(server): State<Arc<Server>>,
    JsonPayload(request): JsonPayload<PromptRequest>,
) -> Result<Json<TextResponse>> {
    let prompt = require_prompt(request.prompt.as_deref())?;

    tracing::debug!(prompt_len = prompt.len(), "text generation handler called");

    let text = server.generate_text(prompt).await?;

    Ok(Json(TextResponse { text }))
}

/// Forward backend chunks to the client as they arrive
///
/// The upstream stream lives inside the response body, so a client
/// disconnect drops it and closes the upstream connection.
async fn generate_text_stream(
    State(server): State<Arc<Server>>,
    JsonPayload(request): JsonPayload<PromptRequest>,
) -> Result<Response> {
    let prompt = require_prompt(request.prompt.as_deref())?;

    tracing::debug!(prompt_len = prompt.len(), "text stream handler called");

    let chunks = server.stream_text(prompt).await?;

    let body = chunks.map(|chunk| {
        chunk.map(bytes::Bytes::from).inspect_err(|e| {
            tracing::warn!(error = %e, "text stream ended with error");
        })
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}

async fn generate_image(
    State(server): State<Arc<Server>>,
    JsonPayload(request): JsonPayload<ImageRequest>,
) -> Result<Json<ImageResponse>> {
    let prompt = require_prompt(request.prompt.as_deref())?;
    let negative_prompt = non_blank(request.negative_prompt.as_deref());

    tracing::debug!(prompt_len = prompt.len(), "image generation handler called");

    let artifact = server.generate_image(prompt, negative_prompt).await?;

    Ok(Json(ImageResponse {
        image_path: artifact.path.display().to_string(),
        image_url: artifact.url.to_string(),
    }))
}

async fn generate_video(
    State(server): State<Arc<Server>>,
    JsonPayload(request): JsonPayload<PromptRequest>,
) -> Result<Json<VideoResponse>> {
    let prompt = require_prompt(request.prompt.as_deref())?;

    tracing::debug!(prompt_len = prompt.len(), "video generation handler called");

    let artifact = server.generate_video(prompt).await?;

    Ok(Json(VideoResponse {
        video_path: artifact.path.display().to_string(),
        video_url: artifact.url.to_string(),
    }))
}

async fn describe_image(
    State(server): State<Arc<Server>>,
    JsonPayload(request): JsonPayload<DescribeImageRequest>,
) -> Result<Json<TextResponse>> {
    let image_url = non_blank(request.image_url.as_deref())
        .ok_or_else(|| GenAiError::InvalidRequest("image_url is required".to_string()))?;
    let prompt = non_blank(request.prompt.as_deref()).unwrap_or(DEFAULT_DESCRIBE_PROMPT);

    tracing::debug!("describe image handler called");

    let text = server.describe_image(image_url, prompt).await?;

    Ok(Json(TextResponse { text }))
}
