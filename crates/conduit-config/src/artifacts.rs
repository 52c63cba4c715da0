use std::path::PathBuf;

use serde::Deserialize;
use url::Url;

/// Storage for generated images and videos
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsConfig {
    /// Directory generated images are written to
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    /// Directory generated videos are written to
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,
    /// Public base URL used to build `image_url` / `video_url`
    #[serde(default = "default_public_url")]
    pub public_url: Url,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            video_dir: default_video_dir(),
            public_url: default_public_url(),
        }
    }
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("generated_images")
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("generated_videos")
}

#[allow(clippy::missing_panics_doc)]
fn default_public_url() -> Url {
    Url::parse("http://localhost:5001").expect("valid default URL")
}
