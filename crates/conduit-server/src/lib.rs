mod cors;
mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use conduit_config::Config;
use conduit_music::VoiceBackend;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Generative and quiz routes are mounted when a backend key is
    /// configured; music routes when music is enabled. `voice` turns on
    /// the playback routes.
    ///
    /// # Errors
    ///
    /// Returns an error if the generative provider or the artifact
    /// directories cannot be set up
    pub fn new(config: &Config, voice: Option<Arc<dyn VoiceBackend>>) -> anyhow::Result<Self> {
        let listen_address = config.server.listen_address();

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // Generative, artifact and quiz routes share one provider
        if config.has_genai() {
            let genai_state = conduit_genai::build_server(config)?;
            let quiz_state = conduit_quiz::build_state(config, genai_state.provider());

            app = app.merge(conduit_genai::artifact_router(genai_state.store()));
            app = app.merge(conduit_genai::endpoint_router().with_state(genai_state));
            app = app.merge(conduit_quiz::endpoint_router().with_state(quiz_state));
        } else {
            tracing::info!("genai.api_key not set, generative and quiz routes disabled");
        }

        // Music routes
        if config.music.enabled {
            let music_state = conduit_music::build_state(config, voice);
            app = app.merge(conduit_music::endpoint_router().with_state(music_state));
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = config.server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Override the listen address, e.g. from the command line
    #[must_use]
    pub fn with_listen_address(mut self, listen_address: SocketAddr) -> Self {
        self.listen_address = listen_address;
        self
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
