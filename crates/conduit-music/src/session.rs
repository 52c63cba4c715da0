//! Per-guild playback sessions
//!
//! Each guild with activity gets one actor task that owns its queue.
//! HTTP handlers and track-end callbacks talk to it over a channel, so
//! queue state is only ever touched by that task.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use crate::error::{MusicError, Result};
use crate::ids::{ChannelId, GuildId};
use crate::track::Track;
use crate::voice::{TrackEndSignal, VoiceBackend};

/// Commands buffered per session before senders wait
const MAILBOX_CAPACITY: usize = 32;

#[derive(Debug)]
pub(crate) enum SessionCommand {
    Enqueue {
        channel: ChannelId,
        track: Track,
        reply: oneshot::Sender<Result<usize>>,
    },
    Skip {
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },
    Snapshot {
        reply: oneshot::Sender<QueueSnapshot>,
    },
    TrackEnded {
        generation: u64,
    },
}

/// What a guild is playing and what is queued behind it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub current: Option<Track>,
    pub pending: Vec<Track>,
}

/// Registry of live guild sessions
pub struct SessionRegistry {
    sessions: DashMap<GuildId, mpsc::Sender<SessionCommand>>,
    backend: Arc<dyn VoiceBackend>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn VoiceBackend>) -> Self {
        Self {
            sessions: DashMap::new(),
            backend,
        }
    }

    /// Queue a track, joining `channel` first if the guild is not connected
    ///
    /// Returns the track's position: 0 when it started playing right away,
    /// otherwise its 1-based place among pending tracks.
    pub async fn enqueue(&self, guild: GuildId, channel: ChannelId, track: Track) -> Result<usize> {
        let sender = self.session(guild);
        if let Some(result) = Self::send_enqueue(&sender, channel, track.clone()).await {
            return result;
        }

        // The session stopped before taking the track; start a fresh one
        self.evict(guild, &sender);
        Self::send_enqueue(&self.session(guild), channel, track)
            .await
            .unwrap_or(Err(MusicError::SessionClosed))
    }

    /// `None` when the session closed before answering
    async fn send_enqueue(
        sender: &mpsc::Sender<SessionCommand>,
        channel: ChannelId,
        track: Track,
    ) -> Option<Result<usize>> {
        let (reply, response) = oneshot::channel();
        sender
            .send(SessionCommand::Enqueue { channel, track, reply })
            .await
            .ok()?;
        response.await.ok()
    }

    /// Stop the current track so the queue advances
    pub async fn skip(&self, guild: GuildId) -> Result<()> {
        let Some(sender) = self.existing(guild) else {
            return Err(MusicError::NotPlaying);
        };

        let (reply, response) = oneshot::channel();
        if sender.send(SessionCommand::Skip { reply }).await.is_err() {
            return Err(MusicError::NotPlaying);
        }

        response.await.map_err(|_| MusicError::NotPlaying)?
    }

    /// Clear the queue, stop playback and leave the voice channel
    pub async fn stop(&self, guild: GuildId) -> Result<()> {
        let Some(sender) = self.existing(guild) else {
            return Ok(());
        };

        let (reply, response) = oneshot::channel();
        let result = if sender.send(SessionCommand::Stop { reply }).await.is_ok() {
            response.await.unwrap_or(Ok(()))
        } else {
            Ok(())
        };

        self.evict(guild, &sender);

        result
    }

    /// Current and pending tracks for a guild
    pub async fn snapshot(&self, guild: GuildId) -> QueueSnapshot {
        let Some(sender) = self.existing(guild) else {
            return QueueSnapshot::default();
        };

        let (reply, response) = oneshot::channel();
        if sender.send(SessionCommand::Snapshot { reply }).await.is_err() {
            return QueueSnapshot::default();
        }

        response.await.unwrap_or_default()
    }

    /// Number of guilds with a live session
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop the registry entry if it still points at the closed session `dead`
    fn evict(&self, guild: GuildId, dead: &mpsc::Sender<SessionCommand>) {
        self.sessions
            .remove_if(&guild, |_, current| current.same_channel(dead) || current.is_closed());
    }

    fn existing(&self, guild: GuildId) -> Option<mpsc::Sender<SessionCommand>> {
        self.sessions.get(&guild).map(|entry| entry.value().clone())
    }

    fn session(&self, guild: GuildId) -> mpsc::Sender<SessionCommand> {
        self.sessions
            .entry(guild)
            .or_insert_with(|| Session::spawn(guild, Arc::clone(&self.backend)))
            .value()
            .clone()
    }
}

/// Actor state for one guild
struct Session {
    guild: GuildId,
    backend: Arc<dyn VoiceBackend>,
    mailbox: mpsc::Sender<SessionCommand>,
    channel: Option<ChannelId>,
    current: Option<Track>,
    pending: VecDeque<Track>,
    /// Bumped on every play and stop; end events carry the value they were armed with
    generation: u64,
}

impl Session {
    fn spawn(guild: GuildId, backend: Arc<dyn VoiceBackend>) -> mpsc::Sender<SessionCommand> {
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);

        let session = Self {
            guild,
            backend,
            mailbox: sender.clone(),
            channel: None,
            current: None,
            pending: VecDeque::new(),
            generation: 0,
        };

        tracing::debug!(guild = %guild, "starting playback session");
        tokio::spawn(session.run(receiver));

        sender
    }

    async fn run(mut self, mut receiver: mpsc::Receiver<SessionCommand>) {
        while let Some(command) = receiver.recv().await {
            match command {
                SessionCommand::Enqueue { channel, track, reply } => {
                    let _ = reply.send(self.enqueue(channel, track).await);
                }
                SessionCommand::Skip { reply } => {
                    let _ = reply.send(self.skip().await);
                }
                SessionCommand::Stop { reply } => {
                    let result = self.stop().await;
                    let _ = reply.send(result);
                    break;
                }
                SessionCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                SessionCommand::TrackEnded { generation } => {
                    self.track_ended(generation).await;
                }
            }
        }

        tracing::debug!(guild = %self.guild, "playback session ended");
    }

    async fn enqueue(&mut self, channel: ChannelId, track: Track) -> Result<usize> {
        if self.channel.is_none() {
            self.backend.join(self.guild, channel).await?;
            self.channel = Some(channel);
            tracing::info!(guild = %self.guild, channel = %channel, "joined voice channel");
        }

        tracing::info!(guild = %self.guild, title = %track.title, "queued track");
        self.pending.push_back(track);

        if self.current.is_some() {
            return Ok(self.pending.len());
        }

        self.advance().await?;
        Ok(0)
    }

    async fn skip(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Err(MusicError::NotPlaying);
        }

        // The backend's end event advances the queue
        self.backend.stop(self.guild).await
    }

    async fn stop(&mut self) -> Result<()> {
        self.pending.clear();
        self.current = None;
        self.generation += 1;

        if self.channel.take().is_some() {
            if let Err(e) = self.backend.stop(self.guild).await {
                tracing::warn!(guild = %self.guild, error = %e, "failed to stop playback");
            }
            self.backend.leave(self.guild).await?;
            tracing::info!(guild = %self.guild, "left voice channel");
        }

        Ok(())
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current.clone(),
            pending: self.pending.iter().cloned().collect(),
        }
    }

    async fn track_ended(&mut self, generation: u64) {
        if generation != self.generation {
            tracing::debug!(guild = %self.guild, generation, current = self.generation, "ignoring stale track end");
            return;
        }

        self.current = None;

        if let Err(e) = self.advance().await {
            tracing::warn!(guild = %self.guild, error = %e, "failed to start next track");
        }
    }

    /// Play the next pending track, skipping tracks the backend rejects
    ///
    /// Goes idle when the queue runs out. Returns the last playback error
    /// if nothing could be started.
    async fn advance(&mut self) -> Result<()> {
        let mut last_error = None;

        while let Some(track) = self.pending.pop_front() {
            self.generation += 1;
            let signal = TrackEndSignal::new(self.mailbox.clone(), self.generation);

            match self.backend.play(self.guild, &track, signal).await {
                Ok(()) => {
                    tracing::info!(guild = %self.guild, title = %track.title, "now playing");
                    self.current = Some(track);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(guild = %self.guild, title = %track.title, error = %e, "failed to play track");
                    last_error = Some(e);
                }
            }
        }

        tracing::debug!(guild = %self.guild, "queue finished");
        last_error.map_or(Ok(()), Err)
    }
}
