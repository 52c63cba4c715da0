//! Provider trait and implementations for generative backends

pub mod google;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::error::Result;

/// Text chunks from a streaming generation, in arrival order
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Image passed inline to a multimodal request
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub data: Bytes,
    pub mime_type: String,
}

/// Trait implemented by each generative backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Generate a complete text response for a prompt
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Generate text as a stream of chunks
    async fn stream_text(&self, prompt: &str) -> Result<TextStream>;

    /// Describe an image, guided by a text prompt
    async fn describe_image(&self, image: &InlineImage, prompt: &str) -> Result<String>;

    /// Synthesize one PNG image
    async fn generate_image(&self, prompt: &str, negative_prompt: Option<&str>) -> Result<Bytes>;

    /// Synthesize one MP4 video, waiting for the long-running operation
    async fn generate_video(&self, prompt: &str) -> Result<Bytes>;
}
