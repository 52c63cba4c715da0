#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;
#[cfg(feature = "discord")]
mod discord;

use args::Args;
use clap::Parser;
use conduit_config::Config;
use conduit_server::Server;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    let _telemetry_guard = conduit_telemetry::init(config.telemetry.as_ref(), "info")?;

    tracing::info!(
        config_path = %args.config.display(),
        genai = config.has_genai(),
        music = config.music.enabled,
        voice = config.has_voice(),
        "starting conduit"
    );

    // Start Discord voice, if configured
    let voice = start_voice(&config).await?;
    let backend = voice.as_ref().map(Voice::backend);

    // Build server
    let mut server = Server::new(&config, backend)?;
    if let Some(listen) = args.listen {
        server = server.with_listen_address(listen);
    }

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    // Run server
    let served = server.serve(shutdown).await;

    if let Some(voice) = voice {
        voice.shutdown().await;
    }

    served?;

    tracing::info!("conduit stopped");
    Ok(())
}

#[cfg(feature = "discord")]
type Voice = discord::DiscordVoice;

#[cfg(feature = "discord")]
async fn start_voice(config: &Config) -> anyhow::Result<Option<Voice>> {
    use secrecy::ExposeSecret;

    let token = match config.music.discord_token.as_ref() {
        Some(token) if config.has_voice() => token,
        _ => return Ok(None),
    };

    discord::DiscordVoice::start(token.expose_secret()).await.map(Some)
}

/// Placeholder when built without Discord support; never constructed
#[cfg(not(feature = "discord"))]
enum Voice {}

#[cfg(not(feature = "discord"))]
impl Voice {
    fn backend(&self) -> std::sync::Arc<dyn conduit_music::VoiceBackend> {
        match *self {}
    }

    async fn shutdown(self) {
        match self {}
    }
}

#[cfg(not(feature = "discord"))]
#[allow(clippy::unused_async)]
async fn start_voice(config: &Config) -> anyhow::Result<Option<Voice>> {
    if config.has_voice() {
        tracing::warn!("music.discord_token is set but conduit was built without the discord feature");
    }
    Ok(None)
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
