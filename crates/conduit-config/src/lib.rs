#![allow(clippy::must_use_candidate)]

pub mod artifacts;
pub mod cors;
mod env;
pub mod genai;
pub mod health;
mod loader;
pub mod music;
pub mod quiz;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use artifacts::*;
pub use cors::*;
pub use genai::*;
pub use health::*;
pub use music::*;
pub use quiz::*;
pub use server::*;
pub use telemetry::{ExportProtocol, ExporterConfig, LogFormat, TelemetryConfig};

/// Top-level Conduit configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Generative backend configuration
    #[serde(default)]
    pub genai: GenAiConfig,
    /// Where generated images and videos are written and served from
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// Quiz generation settings
    #[serde(default)]
    pub quiz: QuizConfig,
    /// Music lookup and voice playback
    #[serde(default)]
    pub music: MusicConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
