use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::Client;

use crate::artifacts::{Artifact, ArtifactKind, ArtifactStore};
use crate::error::{GenAiError, Result};
use crate::provider::{InlineImage, Provider, TextStream};

/// MIME type assumed when a fetched image carries no `Content-Type`
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Largest image forwarded as inline data (20 MiB)
const MAX_IMAGE_BYTES: usize = 20 << 20;

/// Generative server: one backend provider plus the artifact store
pub struct Server {
    provider: Arc<dyn Provider>,
    store: ArtifactStore,
    fetcher: Client,
    image_limit: usize,
}

impl Server {
    /// `fetcher` downloads images for description and should carry a timeout
    pub fn new(provider: Arc<dyn Provider>, store: ArtifactStore, fetcher: Client) -> Self {
        Self {
            provider,
            store,
            fetcher,
            image_limit: MAX_IMAGE_BYTES,
        }
    }

    /// Override the largest image `describe_image` accepts
    #[must_use]
    pub fn with_image_limit(mut self, limit: usize) -> Self {
        self.image_limit = limit;
        self
    }

    /// Backend provider, shared with other feature crates
    pub fn provider(&self) -> Arc<dyn Provider> {
        Arc::clone(&self.provider)
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.provider.generate_text(prompt).await
    }

    pub async fn stream_text(&self, prompt: &str) -> Result<TextStream> {
        self.provider.stream_text(prompt).await
    }

    /// Generate one image and save it as a PNG artifact
    pub async fn generate_image(&self, prompt: &str, negative_prompt: Option<&str>) -> Result<Artifact> {
        let image = self.provider.generate_image(prompt, negative_prompt).await?;
        self.store.save(ArtifactKind::Image, &image).await
    }

    /// Generate one video and save it as an MP4 artifact
    pub async fn generate_video(&self, prompt: &str) -> Result<Artifact> {
        let video = self.provider.generate_video(prompt).await?;
        self.store.save(ArtifactKind::Video, &video).await
    }

    /// Fetch the image at `image_url` and ask the backend to describe it
    pub async fn describe_image(&self, image_url: &str, prompt: &str) -> Result<String> {
        let image = self.fetch_image(image_url).await?;
        self.provider.describe_image(&image, prompt).await
    }

    async fn fetch_image(&self, image_url: &str) -> Result<InlineImage> {
        let url = url::Url::parse(image_url)
            .map_err(|e| GenAiError::InvalidRequest(format!("image_url is not a valid URL: {e}")))?;

        let response = self.fetcher.get(url).send().await.map_err(|e| {
            tracing::warn!(error = %e, "image download failed");
            GenAiError::ImageFetch(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenAiError::ImageFetch(format!("image host returned {status}")));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_owned();

        let too_large = || GenAiError::InvalidRequest(format!("image is larger than {} bytes", self.image_limit));

        let limit = u64::try_from(self.image_limit).unwrap_or(u64::MAX);
        if response.content_length().is_some_and(|length| length > limit) {
            return Err(too_large());
        }

        // Content-Length is optional; count while reading
        let mut data = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| GenAiError::ImageFetch(e.to_string()))?;
            if data.len() + chunk.len() > self.image_limit {
                return Err(too_large());
            }
            data.extend_from_slice(&chunk);
        }
        let data = Bytes::from(data);

        tracing::debug!(mime_type = %mime_type, size = data.len(), "fetched image");

        Ok(InlineImage { data, mime_type })
    }
}
