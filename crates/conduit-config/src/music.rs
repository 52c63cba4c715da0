use secrecy::SecretString;
use serde::Deserialize;

/// Music lookup and voice playback configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MusicConfig {
    /// Mount the music routes at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Path or name of the `yt-dlp` executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// Bot token; voice playback is disabled without one
    #[serde(default)]
    pub discord_token: Option<SecretString>,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ytdlp_path: default_ytdlp_path(),
            discord_token: None,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}
