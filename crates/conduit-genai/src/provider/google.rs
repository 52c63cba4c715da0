//! Google Generative Language API provider (Gemini, Imagen, Veo)

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use conduit_config::GenAiConfig;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{InlineImage, Provider, TextStream};
use crate::error::{GenAiError, Result};
use crate::protocol::{
    GoogleInlineData, GooglePart, GoogleRequest, GoogleResponse, ImageParameters, LongRunningRequest, Operation,
    PredictRequest, PredictResponse, PromptInstance,
};

/// Header carrying the API key on every upstream call
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Generative Language API provider
pub struct GoogleProvider {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    text_model: String,
    image_model: String,
    video_model: String,
    poll_interval: Duration,
    video_timeout: Duration,
}

impl GoogleProvider {
    /// Create from the `[genai]` configuration section
    ///
    /// # Errors
    ///
    /// Returns `GenAiError::Config` if the key is missing, a duration is
    /// invalid, or the HTTP client cannot be built
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or_else(|| GenAiError::Config("genai.api_key is not set".to_string()))?;

        let request_timeout = config.request_timeout().map_err(|e| GenAiError::Config(e.to_string()))?;
        let poll_interval = config.poll_interval().map_err(|e| GenAiError::Config(e.to_string()))?;
        let video_timeout = config.video_timeout().map_err(|e| GenAiError::Config(e.to_string()))?;

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GenAiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
            poll_interval,
            video_timeout,
        })
    }

    /// Build `{base}/models/{model}:{method}`
    fn model_url(&self, model: &str, method: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{model}:{method}")
    }

    /// Build `{base}/{operation}` for polling a long-running operation
    fn operation_url(&self, operation: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{}", operation.trim_start_matches('/'))
    }

    /// Attach the key, send, and turn non-2xx statuses into errors
    async fn send(&self, request: RequestBuilder, operation: &'static str) -> Result<Response> {
        let response = request
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(operation, error = %e, "upstream request failed");
                GenAiError::Connection(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(operation, status = %status, "upstream returned error");
            return Err(GenAiError::upstream(status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn generate_content(&self, request: &GoogleRequest) -> Result<String> {
        let url = self.model_url(&self.text_model, "generateContent");

        let response = self
            .send(self.client.post(&url).json(request), "generateContent")
            .await?;

        let wire_response: GoogleResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::Connection(format!("failed to parse response: {e}")))?;

        if let Some(reason) = wire_response.block_reason() {
            return Err(GenAiError::EmptyResponse(format!("prompt blocked: {reason}")));
        }

        wire_response
            .text()
            .filter(|text| !text.is_empty())
            .ok_or_else(|| GenAiError::EmptyResponse("no candidates".to_string()))
    }

    /// Poll an operation until it reports `done`
    async fn wait_for_operation(&self, mut operation: Operation) -> Result<Operation> {
        let url = self.operation_url(&operation.name);

        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;

            tracing::debug!(operation = %operation.name, "polling video operation");

            let response = self.send(self.client.get(&url), "getOperation").await?;
            operation = response
                .json()
                .await
                .map_err(|e| GenAiError::Connection(format!("failed to parse operation: {e}")))?;
        }

        Ok(operation)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.text_model, "generating text");

        let request = GoogleRequest::user(vec![GooglePart::Text(prompt.to_owned())]);
        self.generate_content(&request).await
    }

    async fn stream_text(&self, prompt: &str) -> Result<TextStream> {
        tracing::debug!(model = %self.text_model, "streaming text");

        let url = self.model_url(&self.text_model, "streamGenerateContent?alt=sse");
        let request = GoogleRequest::user(vec![GooglePart::Text(prompt.to_owned())]);

        let response = self
            .send(self.client.post(&url).json(&request), "streamGenerateContent")
            .await?;

        // SSE with one JSON `GenerateContentResponse` per data line
        let chunks = response.bytes_stream().eventsource().filter_map(|result| async move {
            match result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        return None;
                    }

                    match serde_json::from_str::<GoogleResponse>(data) {
                        Ok(chunk) => chunk.text().filter(|text| !text.is_empty()).map(Ok),
                        Err(e) => {
                            tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
                            None
                        }
                    }
                }
                Err(e) => Some(Err(GenAiError::Streaming(e.to_string()))),
            }
        });

        Ok(Box::pin(chunks))
    }

    async fn describe_image(&self, image: &InlineImage, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.text_model, mime_type = %image.mime_type, "describing image");

        let request = GoogleRequest::user(vec![
            GooglePart::InlineData(GoogleInlineData {
                mime_type: image.mime_type.clone(),
                data: STANDARD.encode(&image.data),
            }),
            GooglePart::Text(prompt.to_owned()),
        ]);

        self.generate_content(&request).await
    }

    async fn generate_image(&self, prompt: &str, negative_prompt: Option<&str>) -> Result<Bytes> {
        tracing::debug!(model = %self.image_model, "generating image");

        let url = self.model_url(&self.image_model, "predict");
        let request = PredictRequest {
            instances: vec![PromptInstance {
                prompt: prompt.to_owned(),
            }],
            parameters: ImageParameters {
                sample_count: 1,
                negative_prompt: negative_prompt.map(str::to_owned),
            },
        };

        let response = self.send(self.client.post(&url).json(&request), "predict").await?;

        let wire_response: PredictResponse = response
            .json()
            .await
            .map_err(|e| GenAiError::Connection(format!("failed to parse response: {e}")))?;

        let encoded = wire_response
            .predictions
            .into_iter()
            .find_map(|prediction| prediction.bytes_base64_encoded)
            .ok_or_else(|| GenAiError::EmptyResponse("no images generated".to_string()))?;

        STANDARD
            .decode(encoded)
            .map(Bytes::from)
            .map_err(|e| GenAiError::Connection(format!("invalid image payload: {e}")))
    }

    async fn generate_video(&self, prompt: &str) -> Result<Bytes> {
        tracing::debug!(model = %self.video_model, "submitting video generation");

        let url = self.model_url(&self.video_model, "predictLongRunning");
        let request = LongRunningRequest {
            instances: vec![PromptInstance {
                prompt: prompt.to_owned(),
            }],
        };

        let response = self
            .send(self.client.post(&url).json(&request), "predictLongRunning")
            .await?;

        let operation: Operation = response
            .json()
            .await
            .map_err(|e| GenAiError::Connection(format!("failed to parse operation: {e}")))?;

        tracing::info!(operation = %operation.name, "video generation started");

        let operation = tokio::time::timeout(self.video_timeout, self.wait_for_operation(operation))
            .await
            .map_err(|_| GenAiError::VideoTimeout(self.video_timeout))??;

        if let Some(error) = operation.error.as_ref() {
            return Err(GenAiError::OperationFailed(format!("{} (code {})", error.message, error.code)));
        }

        let uri = operation
            .video_uri()
            .ok_or_else(|| GenAiError::EmptyResponse("no videos generated".to_string()))?;

        tracing::debug!(operation = %operation.name, "downloading generated video");

        let video = self.send(self.client.get(uri), "downloadVideo").await?;
        video
            .bytes()
            .await
            .map_err(|e| GenAiError::Connection(format!("failed to download video: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GenAiConfig {
        GenAiConfig {
            api_key: Some(SecretString::from("AIza-test")),
            base_url: Url::parse("http://127.0.0.1:9000/v1beta/").unwrap(),
            ..GenAiConfig::default()
        }
    }

    #[test]
    fn urls_are_built_from_base() {
        let provider = GoogleProvider::new(&config()).unwrap();

        assert_eq!(
            provider.model_url("gemini-2.5-flash", "generateContent"),
            "http://127.0.0.1:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            provider.operation_url("models/veo-3.0-generate-001/operations/abc"),
            "http://127.0.0.1:9000/v1beta/models/veo-3.0-generate-001/operations/abc"
        );
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let config = GenAiConfig {
            api_key: Some(SecretString::from("")),
            ..GenAiConfig::default()
        };

        assert!(matches!(GoogleProvider::new(&config), Err(GenAiError::Config(_))));
    }
}
