use std::sync::Arc;

use conduit_music::{SongbirdBackend, VoiceBackend};
use serenity::Client;
use serenity::gateway::ShardManager;
use serenity::model::gateway::GatewayIntents;
use songbird::{SerenityInit, Songbird};
use tokio::task::JoinHandle;

/// Running Discord client that owns the voice connections
pub struct DiscordVoice {
    backend: Arc<SongbirdBackend>,
    shard_manager: Arc<ShardManager>,
    task: JoinHandle<()>,
}

impl DiscordVoice {
    /// Log in and start the gateway connection in the background
    pub async fn start(token: &str) -> anyhow::Result<Self> {
        let manager = Songbird::serenity();
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

        let mut client = Client::builder(token, intents)
            .register_songbird_with(Arc::clone(&manager))
            .await
            .map_err(|e| anyhow::anyhow!("failed to build Discord client: {e}"))?;

        let shard_manager = Arc::clone(&client.shard_manager);

        let task = tokio::spawn(async move {
            if let Err(e) = client.start().await {
                tracing::error!(error = %e, "Discord client stopped");
            }
        });

        tracing::info!("Discord voice client started");

        Ok(Self {
            backend: Arc::new(SongbirdBackend::new(manager)),
            shard_manager,
            task,
        })
    }

    pub fn backend(&self) -> Arc<dyn VoiceBackend> {
        self.backend.clone()
    }

    /// Disconnect all shards and wait for the client task
    pub async fn shutdown(self) {
        self.shard_manager.shutdown_all().await;

        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Discord client task failed");
        }

        tracing::info!("Discord voice client stopped");
    }
}
