//! Voice backend on top of songbird, registered on a serenity client

use std::sync::Arc;

use async_trait::async_trait;
use serenity::model::id::{ChannelId as DiscordChannelId, GuildId as DiscordGuildId};
use songbird::error::JoinError;
use songbird::events::{Event, EventContext, EventHandler, TrackEvent};
use songbird::input::YoutubeDl;
use songbird::Songbird;

use crate::error::{MusicError, Result};
use crate::ids::{ChannelId, GuildId};
use crate::track::Track;
use crate::voice::{TrackEndSignal, VoiceBackend};

/// Events after which a track will never produce audio again
///
/// A track that fails to load or decode fires `Error` instead of `End`.
const TRACK_FINISHED_EVENTS: [TrackEvent; 2] = [TrackEvent::End, TrackEvent::Error];

/// Forwards songbird's track-end event to the guild session
#[derive(Clone)]
struct TrackEndNotifier {
    signal: TrackEndSignal,
}

#[async_trait]
impl EventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        self.signal.notify().await;
        None
    }
}

/// Plays tracks through a songbird voice manager
pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
        }
    }
}

fn guild_id(guild: GuildId) -> Result<DiscordGuildId> {
    if guild.0 == 0 {
        return Err(MusicError::InvalidRequest("guild_id must be non-zero".to_string()));
    }
    Ok(DiscordGuildId::new(guild.0))
}

fn channel_id(channel: ChannelId) -> Result<DiscordChannelId> {
    if channel.0 == 0 {
        return Err(MusicError::InvalidRequest("channel_id must be non-zero".to_string()));
    }
    Ok(DiscordChannelId::new(channel.0))
}

#[async_trait]
impl VoiceBackend for SongbirdBackend {
    async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        self.manager
            .join(guild_id(guild)?, channel_id(channel)?)
            .await
            .map(|_call| ())
            .map_err(|e| MusicError::Voice(format!("failed to join voice channel: {e}")))
    }

    async fn play(&self, guild: GuildId, track: &Track, on_end: TrackEndSignal) -> Result<()> {
        let call = self
            .manager
            .get(guild_id(guild)?)
            .ok_or_else(|| MusicError::Voice("not connected to a voice channel".to_string()))?;

        let source = YoutubeDl::new(self.http.clone(), track.webpage_url.clone());

        let mut handler = call.lock().await;
        let track_handle = handler.play_only(source.into());

        let notifier = TrackEndNotifier { signal: on_end };
        for event in TRACK_FINISHED_EVENTS {
            track_handle
                .add_event(Event::Track(event), notifier.clone())
                .map_err(|e| MusicError::Voice(format!("failed to watch track: {e}")))?;
        }

        Ok(())
    }

    async fn stop(&self, guild: GuildId) -> Result<()> {
        if let Some(call) = self.manager.get(guild_id(guild)?) {
            call.lock().await.stop();
        }
        Ok(())
    }

    async fn leave(&self, guild: GuildId) -> Result<()> {
        match self.manager.remove(guild_id(guild)?).await {
            Ok(()) | Err(JoinError::NoCall) => Ok(()),
            Err(e) => Err(MusicError::Voice(format!("failed to leave voice channel: {e}"))),
        }
    }
}
