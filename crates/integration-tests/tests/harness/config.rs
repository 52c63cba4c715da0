//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;

use conduit_config::{
    ArtifactsConfig, Config, CorsConfig, GenAiConfig, HealthConfig, MusicConfig, QuizConfig, ServerConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder that writes artifacts under `artifact_root`
    pub fn new(artifact_root: &Path) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                genai: GenAiConfig::default(),
                artifacts: ArtifactsConfig {
                    image_dir: artifact_root.join("images"),
                    video_dir: artifact_root.join("videos"),
                    ..ArtifactsConfig::default()
                },
                quiz: QuizConfig::default(),
                music: MusicConfig::default(),
                telemetry: None,
            },
        }
    }

    /// Point the generative backend at a mock server
    pub fn with_gemini(mut self, base_url: &str) -> Self {
        self.config.genai.api_key = Some(SecretString::from("test-key"));
        self.config.genai.base_url = base_url.parse().expect("valid URL");
        self.config.genai.poll_interval = "10ms".to_owned();
        self
    }

    /// Give up on video operations after `timeout`
    pub fn with_video_timeout(mut self, timeout: &str) -> Self {
        self.config.genai.video_timeout = timeout.to_owned();
        self
    }

    /// Limit how much quiz history reaches the prompt
    pub fn with_quiz_history(mut self, max_history: usize) -> Self {
        self.config.quiz.max_history = max_history;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Run `path` instead of the `yt-dlp` on `PATH`
    pub fn with_ytdlp(mut self, path: &Path) -> Self {
        self.config.music.ytdlp_path = path.display().to_string();
        self
    }

    /// Disable music routes
    pub fn without_music(mut self) -> Self {
        self.config.music.enabled = false;
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}
