use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Whether a generative backend key is configured
    pub fn has_genai(&self) -> bool {
        self.genai
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    /// Whether voice playback can be started
    pub fn has_voice(&self) -> bool {
        self.music.enabled
            && self
                .music
                .discord_token
                .as_ref()
                .is_some_and(|token| !token.expose_secret().is_empty())
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is enabled, a duration does not parse,
    /// or a model/path setting is empty
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_has_downstreams()?;
        self.validate_genai_config()?;
        self.validate_music_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    /// Ensure at least one feature is reachable
    fn validate_has_downstreams(&self) -> anyhow::Result<()> {
        if !self.has_genai() && !self.music.enabled {
            anyhow::bail!("nothing to serve: configure genai.api_key or enable music");
        }

        Ok(())
    }

    fn validate_genai_config(&self) -> anyhow::Result<()> {
        let genai = &self.genai;

        for (field, model) in [
            ("text_model", &genai.text_model),
            ("image_model", &genai.image_model),
            ("video_model", &genai.video_model),
        ] {
            if model.trim().is_empty() {
                anyhow::bail!("genai.{field} must not be empty");
            }
        }

        genai.request_timeout()?;
        let poll_interval = genai.poll_interval()?;
        let video_timeout = genai.video_timeout()?;

        if poll_interval.is_zero() {
            anyhow::bail!("genai.poll_interval must be greater than 0");
        }

        if video_timeout < poll_interval {
            anyhow::bail!("genai.video_timeout must not be shorter than genai.poll_interval");
        }

        Ok(())
    }

    fn validate_music_config(&self) -> anyhow::Result<()> {
        if self.music.enabled && self.music.ytdlp_path.trim().is_empty() {
            anyhow::bail!("music.ytdlp_path must not be empty");
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        if let Some(ref telemetry) = self.telemetry
            && !(0.0..=1.0).contains(&telemetry.sampling_rate)
        {
            anyhow::bail!("telemetry.sampling_rate must be between 0.0 and 1.0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use crate::{Config, LogFormat};

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [genai]
            api_key = "AIza-test"
            "#,
        )
        .unwrap();

        assert!(config.has_genai());
        assert!(!config.has_voice());
        assert_eq!(config.server.listen_address().port(), 5001);
        assert_eq!(config.server.health.path, "/health");
        assert_eq!(config.quiz.max_history, 20);
        assert_eq!(config.artifacts.image_dir.to_str(), Some("generated_images"));
        assert_eq!(config.music.ytdlp_path, "yt-dlp");
    }

    #[test]
    fn full_config() {
        let config = Config::from_toml(
            r#"
            [server]
            listen_address = "127.0.0.1:8080"

            [server.health]
            path = "/healthz"

            [server.cors]
            origins = ["http://localhost:3000"]

            [genai]
            api_key = "AIza-test"
            request_timeout = "30s"

            [artifacts]
            image_dir = "/tmp/images"
            public_url = "https://media.example.com"

            [quiz]
            max_history = 5

            [music]
            discord_token = "bot-token"

            [telemetry]
            log_format = "json"
            sampling_rate = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_address().port(), 8080);
        assert_eq!(config.server.health.path, "/healthz");
        assert!(config.server.cors.is_some());
        assert_eq!(config.genai.request_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(config.artifacts.public_url.as_str(), "https://media.example.com/");
        assert_eq!(config.quiz.max_history, 5);
        assert!(config.has_voice());
        assert_eq!(config.telemetry.unwrap().log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_toml(
            r#"
            [genai]
            api_key = "AIza-test"
            temperature = 0.2
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn nothing_enabled_is_rejected() {
        let err = Config::from_toml(
            r#"
            [music]
            enabled = false
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("nothing to serve"));
    }

    #[test]
    fn music_alone_is_enough() {
        let config = Config::from_toml("").unwrap();
        assert!(!config.has_genai());
        assert!(config.music.enabled);
    }

    #[test]
    fn invalid_durations_are_rejected() {
        let err = Config::from_toml(
            r#"
            [genai]
            api_key = "AIza-test"
            poll_interval = "every so often"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("genai.poll_interval"));
    }

    #[test]
    fn video_timeout_shorter_than_poll_is_rejected() {
        let err = Config::from_toml(
            r#"
            [genai]
            api_key = "AIza-test"
            poll_interval = "30s"
            video_timeout = "10s"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("video_timeout"));
    }

    #[test]
    fn out_of_range_sampling_rate_is_rejected() {
        let err = Config::from_toml(
            r#"
            [telemetry]
            sampling_rate = 1.5
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("sampling_rate"));
    }

    #[test]
    fn load_expands_environment() {
        temp_env::with_var("CONDUIT_LOADER_KEY", Some("AIza-from-env"), || {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "[genai]\napi_key = \"{{{{ env.CONDUIT_LOADER_KEY }}}}\"").unwrap();

            let config = Config::load(file.path()).unwrap();
            assert!(config.has_genai());
        });
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(std::path::Path::new("/nonexistent/conduit.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
