use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MusicError, Result};
use crate::track::Track;

/// Resolves a search query or URL to a playable track
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Track>;
}

/// Resolver backed by the `yt-dlp` command line tool
pub struct YtDlpResolver {
    binary: String,
}

/// Fields read from `yt-dlp -j`
#[derive(Deserialize)]
struct YtDlpOutput {
    url: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// URLs are passed through, anything else becomes a single-result search
    pub fn target(query: &str) -> String {
        if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!("ytsearch1:{query}")
        }
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> Result<Track> {
        let target = Self::target(query);

        tracing::debug!(binary = %self.binary, target = %target, "resolving track");

        let output = Command::new(&self.binary)
            .args(["-j", "-f", "bestaudio/best", "--no-playlist", "--no-warnings"])
            .arg(&target)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MusicError::Extractor(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, target = %target, "yt-dlp failed");
            return Err(MusicError::Extractor(stderr.trim().to_string()));
        }

        parse_output(query, &output.stdout)
    }
}

fn parse_output(query: &str, stdout: &[u8]) -> Result<Track> {
    // `ytsearch1:` with no hits exits 0 with empty output
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(MusicError::NoStream(query.to_string()));
    }

    let info: YtDlpOutput =
        serde_json::from_slice(stdout).map_err(|e| MusicError::Extractor(format!("unreadable yt-dlp output: {e}")))?;

    let stream_url = info
        .url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| MusicError::NoStream(query.to_string()))?;

    Ok(Track {
        title: info.title.unwrap_or_else(|| "Unknown title".to_string()),
        webpage_url: info.webpage_url.unwrap_or_else(|| query.to_string()),
        stream_url,
        uploader: info.uploader,
        duration: info.duration,
    })
}
