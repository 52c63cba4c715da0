use serde::{Deserialize, Serialize};

/// A resolved, playable track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    /// Page the track was found on; voice playback re-extracts from here
    pub webpage_url: String,
    /// Direct audio stream URL, short-lived
    pub stream_url: String,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Length in seconds
    #[serde(default)]
    pub duration: Option<f64>,
}
