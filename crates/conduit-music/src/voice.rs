use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::ids::{ChannelId, GuildId};
use crate::session::SessionCommand;
use crate::track::Track;

/// Voice connection and playback primitives for one bot account
#[async_trait]
pub trait VoiceBackend: Send + Sync {
    /// Connect to a voice channel in a guild
    async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<()>;

    /// Replace whatever is playing with `track`
    ///
    /// `on_end` must be notified once when the track finishes or is stopped.
    async fn play(&self, guild: GuildId, track: &Track, on_end: TrackEndSignal) -> Result<()>;

    /// Stop the current track, if any
    async fn stop(&self, guild: GuildId) -> Result<()>;

    /// Disconnect from the guild's voice channel
    async fn leave(&self, guild: GuildId) -> Result<()>;
}

/// Posts a track-end event back to the owning guild session
#[derive(Debug, Clone)]
pub struct TrackEndSignal {
    sender: mpsc::Sender<SessionCommand>,
    generation: u64,
}

impl TrackEndSignal {
    pub(crate) fn new(sender: mpsc::Sender<SessionCommand>, generation: u64) -> Self {
        Self { sender, generation }
    }

    /// Tell the session its track ended
    ///
    /// A closed session ignores the event.
    pub async fn notify(&self) {
        let command = SessionCommand::TrackEnded {
            generation: self.generation,
        };

        if self.sender.send(command).await.is_err() {
            tracing::debug!(generation = self.generation, "track ended after session closed");
        }
    }
}
