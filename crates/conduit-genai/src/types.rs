use serde::{Deserialize, Serialize};

/// Prompt used by `/describe-image` when the caller sends none
pub const DEFAULT_DESCRIBE_PROMPT: &str =
    "If the image contains text, transcribe it exactly. Otherwise, briefly describe what the image shows.";

/// Body of `/generate-text`, `/generate-text-stream` and `/generate-video`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Body of `/generate-image`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

/// Body of `/describe-image`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescribeImageRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image_path: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub video_path: String,
    pub video_url: String,
}

/// Return the trimmed-non-empty value, if any
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
