use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use conduit_config::ArtifactsConfig;
use url::Url;

use crate::error::{GenAiError, Result};

/// Kind of generated artifact, deciding directory, extension and route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Video,
}

impl ArtifactKind {
    fn extension(self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Video => "mp4",
        }
    }

    /// Route prefix the artifact is served under
    pub fn route(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }
}

/// A generated artifact saved to disk
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub url: Url,
}

/// Writes generated media to disk and builds their public URLs
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    image_dir: PathBuf,
    video_dir: PathBuf,
    public_url: Url,
}

impl ArtifactStore {
    /// Create the store, creating both directories if needed
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or resolved
    pub fn open(config: &ArtifactsConfig) -> anyhow::Result<Self> {
        let image_dir = ensure_dir(&config.image_dir)?;
        let video_dir = ensure_dir(&config.video_dir)?;

        tracing::debug!(
            image_dir = %image_dir.display(),
            video_dir = %video_dir.display(),
            "artifact directories ready"
        );

        Ok(Self {
            image_dir,
            video_dir,
            public_url: config.public_url.clone(),
        })
    }

    /// Directory holding artifacts of `kind`
    pub fn dir(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Image => &self.image_dir,
            ArtifactKind::Video => &self.video_dir,
        }
    }

    /// Save bytes under a fresh `{unix_seconds}-{uuid}.{ext}` name
    pub async fn save(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<Artifact> {
        let file_name = file_name(kind);
        let path = self.dir(kind).join(&file_name);

        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to write artifact");
            GenAiError::Internal(format!("failed to write {}: {e}", path.display()))
        })?;

        let url = self.public_url(kind, &file_name)?;

        tracing::info!(path = %path.display(), size = bytes.len(), "saved artifact");

        Ok(Artifact { path, url })
    }

    fn public_url(&self, kind: ArtifactKind, file_name: &str) -> Result<Url> {
        let base = self.public_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{}/{file_name}", kind.route()))
            .map_err(|e| GenAiError::Internal(format!("invalid artifact URL: {e}")))
    }
}

fn ensure_dir(dir: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create artifact directory {}: {e}", dir.display()))?;

    std::fs::canonicalize(dir).map_err(|e| anyhow::anyhow!("failed to resolve {}: {e}", dir.display()))
}

fn file_name(kind: ArtifactKind) -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());

    format!("{seconds}-{}.{}", uuid::Uuid::new_v4().simple(), kind.extension())
}
