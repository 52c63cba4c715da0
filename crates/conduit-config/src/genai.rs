use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Hosted generative backend configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenAiConfig {
    /// API key; generative routes are not mounted without one
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override, mostly for tests and proxies
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Model used for text, streaming, quiz and image description
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Model used for image synthesis
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Model used for video synthesis
    #[serde(default = "default_video_model")]
    pub video_model: String,
    /// Per-request timeout for upstream calls (e.g. "120s")
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    /// Delay between polls of a long-running video operation
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
    /// Upper bound on waiting for a video operation
    #[serde(default = "default_video_timeout")]
    pub video_timeout: String,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
            request_timeout: default_request_timeout(),
            poll_interval: default_poll_interval(),
            video_timeout: default_video_timeout(),
        }
    }
}

impl GenAiConfig {
    /// Parsed `request_timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn request_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("genai.request_timeout", &self.request_timeout)
    }

    /// Parsed `poll_interval`
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn poll_interval(&self) -> anyhow::Result<Duration> {
        parse_duration("genai.poll_interval", &self.poll_interval)
    }

    /// Parsed `video_timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid duration
    pub fn video_timeout(&self) -> anyhow::Result<Duration> {
        parse_duration("genai.video_timeout", &self.video_timeout)
    }
}

pub(crate) fn parse_duration(field: &str, value: &str) -> anyhow::Result<Duration> {
    duration_str::parse(value).map_err(|e| anyhow::anyhow!("invalid duration for {field} '{value}': {e}"))
}

#[allow(clippy::missing_panics_doc)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "imagen-4.0-generate-001".to_string()
}

fn default_video_model() -> String {
    "veo-3.0-generate-001".to_string()
}

fn default_request_timeout() -> String {
    "120s".to_string()
}

fn default_poll_interval() -> String {
    "10s".to_string()
}

fn default_video_timeout() -> String {
    "10m".to_string()
}
