//! Music lookup through `yt-dlp` and per-guild voice playback

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

#[cfg(feature = "discord")]
mod discord;
mod error;
mod ids;
mod resolver;
mod session;
mod track;
mod voice;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use conduit_core::JsonPayload;
use serde::{Deserialize, Serialize};

#[cfg(feature = "discord")]
pub use discord::SongbirdBackend;
pub use error::{MusicError, Result};
pub use ids::{ChannelId, GuildId};
pub use resolver::{TrackResolver, YtDlpResolver};
pub use session::{QueueSnapshot, SessionRegistry};
pub use track::Track;
pub use voice::{TrackEndSignal, VoiceBackend};

/// Shared state for the music endpoints
pub struct MusicState {
    resolver: Arc<dyn TrackResolver>,
    sessions: Option<SessionRegistry>,
}

impl MusicState {
    /// Lookup-only state; playback routes answer 503
    pub fn lookup_only(resolver: Arc<dyn TrackResolver>) -> Self {
        Self {
            resolver,
            sessions: None,
        }
    }

    /// Lookup plus voice playback through `backend`
    pub fn with_voice(resolver: Arc<dyn TrackResolver>, backend: Arc<dyn VoiceBackend>) -> Self {
        Self {
            resolver,
            sessions: Some(SessionRegistry::new(backend)),
        }
    }

    fn sessions(&self) -> Result<&SessionRegistry> {
        self.sessions.as_ref().ok_or(MusicError::VoiceUnavailable)
    }
}

/// Build music state from configuration
///
/// Playback is enabled only when a voice backend is supplied, which the
/// binary does once the Discord client is set up.
pub fn build_state(config: &conduit_config::Config, backend: Option<Arc<dyn VoiceBackend>>) -> Arc<MusicState> {
    let resolver: Arc<dyn TrackResolver> = Arc::new(YtDlpResolver::new(&config.music.ytdlp_path));

    let state = match backend {
        Some(backend) => MusicState::with_voice(resolver, backend),
        None => {
            tracing::debug!("no voice backend, playback routes disabled");
            MusicState::lookup_only(resolver)
        }
    };

    Arc::new(state)
}

/// Create the endpoint router for music lookup and playback
pub fn endpoint_router() -> Router<Arc<MusicState>> {
    Router::new()
        .route("/get-stream-url", post(get_stream_url))
        .route("/play", post(play))
        .route("/skip", post(skip))
        .route("/stop", post(stop))
        .route("/queue/{guild_id}", get(queue))
}

#[derive(Debug, Deserialize)]
pub struct StreamUrlRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StreamUrlResponse {
    pub stream_url: String,
    pub title: String,
    pub uploader: Option<String>,
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlayResponse {
    pub status: String,
    pub title: String,
    pub position: usize,
}

#[derive(Debug, Deserialize)]
pub struct GuildRequest {
    pub guild_id: GuildId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

fn require_query(query: Option<&str>) -> Result<&str> {
    query
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .ok_or_else(|| MusicError::InvalidRequest("query is required".to_string()))
}

async fn get_stream_url(
    State(state): State<Arc<MusicState>>,
    JsonPayload(request): JsonPayload<StreamUrlRequest>,
) -> Result<Json<StreamUrlResponse>> {
    let query = require_query(request.query.as_deref())?;

    let track = state.resolver.resolve(query).await?;

    tracing::debug!(title = %track.title, "resolved stream url");

    Ok(Json(StreamUrlResponse {
        stream_url: track.stream_url,
        title: track.title,
        uploader: track.uploader,
        duration: track.duration,
    }))
}

async fn play(
    State(state): State<Arc<MusicState>>,
    JsonPayload(request): JsonPayload<PlayRequest>,
) -> Result<Json<PlayResponse>> {
    let sessions = state.sessions()?;
    let query = require_query(request.query.as_deref())?;

    // Resolve before touching the session so a bad query enqueues nothing
    let track = state.resolver.resolve(query).await?;
    let title = track.title.clone();

    let position = sessions.enqueue(request.guild_id, request.channel_id, track).await?;

    Ok(Json(PlayResponse {
        status: "added to queue".to_string(),
        title,
        position,
    }))
}

async fn skip(
    State(state): State<Arc<MusicState>>,
    JsonPayload(request): JsonPayload<GuildRequest>,
) -> Result<Json<StatusResponse>> {
    state.sessions()?.skip(request.guild_id).await?;

    Ok(Json(StatusResponse {
        status: "skipped".to_string(),
    }))
}

async fn stop(
    State(state): State<Arc<MusicState>>,
    JsonPayload(request): JsonPayload<GuildRequest>,
) -> Result<Json<StatusResponse>> {
    state.sessions()?.stop(request.guild_id).await?;

    Ok(Json(StatusResponse {
        status: "stopped and disconnected".to_string(),
    }))
}

async fn queue(State(state): State<Arc<MusicState>>, Path(guild_id): Path<u64>) -> Result<Json<QueueSnapshot>> {
    let snapshot = state.sessions()?.snapshot(GuildId(guild_id)).await;
    Ok(Json(snapshot))
}
