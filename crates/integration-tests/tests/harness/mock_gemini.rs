//! Mock Generative Language API server for integration tests
//!
//! Implements the handful of Gemini, Imagen and Veo endpoints the gateway
//! calls and records every request it receives

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// PNG signature followed by a few filler bytes
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nmock-image";

/// Bytes served as the generated video
pub const VIDEO_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42mock-video";

/// Bytes served as the image to describe
pub const PHOTO_BYTES: &[u8] = b"\xff\xd8\xff\xe0mock-photo";

/// A request the mock received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Mock backend that returns predictable responses
pub struct MockGemini {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    addr: SocketAddr,
    /// Text returned from `generateContent`
    text: String,
    /// Text chunks returned from `streamGenerateContent`, in order
    chunks: Vec<String>,
    /// Status for every model call (`None` = succeed)
    fail_status: Option<StatusCode>,
    /// Answer `generateContent` with a blocked prompt
    blocked: bool,
    /// Polls before a video operation reports `done`
    polls_until_done: u32,
    poll_count: AtomicU32,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Builder for a [`MockGemini`]
pub struct MockGeminiBuilder {
    text: String,
    chunks: Vec<String>,
    fail_status: Option<StatusCode>,
    blocked: bool,
    polls_until_done: u32,
}

impl MockGeminiBuilder {
    /// Text returned from `generateContent`
    pub fn text(mut self, text: &str) -> Self {
        text.clone_into(&mut self.text);
        self
    }

    /// Chunks returned from `streamGenerateContent`
    pub fn chunks(mut self, chunks: &[&str]) -> Self {
        self.chunks = chunks.iter().map(|chunk| (*chunk).to_owned()).collect();
        self
    }

    /// Fail every model call with `status`
    pub fn failing(mut self, status: u16) -> Self {
        self.fail_status = Some(StatusCode::from_u16(status).expect("valid status"));
        self
    }

    /// Report the prompt as blocked by safety filters
    pub fn blocked(mut self) -> Self {
        self.blocked = true;
        self
    }

    /// Number of polls before a video operation completes
    pub fn polls_until_done(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }

    /// Start the mock server, returning immediately
    pub async fn start(self) -> anyhow::Result<MockGemini> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockState {
            addr,
            text: self.text,
            chunks: self.chunks,
            fail_status: self.fail_status,
            blocked: self.blocked,
            polls_until_done: self.polls_until_done,
            poll_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1beta/models/{call}", routing::post(handle_model_call))
            .route("/v1beta/models/{model}/operations/{operation}", routing::get(handle_operation))
            .route("/files/video.mp4", routing::get(handle_video_file))
            .route("/assets/cat.jpg", routing::get(handle_photo))
            .with_state(Arc::clone(&state));

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockGemini { addr, shutdown, state })
    }
}

impl MockGemini {
    pub fn builder() -> MockGeminiBuilder {
        MockGeminiBuilder {
            text: "mock response".to_owned(),
            chunks: vec!["Hello".to_owned(), ", ".to_owned(), "world".to_owned()],
            fail_status: None,
            blocked: false,
            polls_until_done: 1,
        }
    }

    /// Start a mock with default responses
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    /// Start a mock whose `generateContent` returns `text`
    pub async fn start_with_text(text: &str) -> anyhow::Result<Self> {
        Self::builder().text(text).start().await
    }

    /// Base URL for configuring the mock as the backend
    ///
    /// Includes `/v1beta` since the provider appends `/models/...`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// URL of an image the gateway can fetch for description
    pub fn photo_url(&self) -> String {
        format!("http://{}/assets/cat.jpg", self.addr)
    }

    /// Every model request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("lock not poisoned").clone()
    }

    /// The most recent model request
    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("at least one request")
    }

    /// Number of operation polls received
    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::Relaxed)
    }
}

impl Drop for MockGemini {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Text of the first part of the first content in a request body
pub fn prompt_text(body: &Value) -> &str {
    body["contents"][0]["parts"]
        .as_array()
        .and_then(|parts| parts.iter().find_map(|part| part["text"].as_str()))
        .unwrap_or_default()
}

// -- Handlers --

async fn handle_model_call(
    State(state): State<Arc<MockState>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().expect("lock not poisoned").push(RecordedRequest {
        path: format!("/v1beta/models/{call}"),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    if let Some(status) = state.fail_status {
        return (
            status,
            Json(json!({
                "error": {
                    "code": status.as_u16(),
                    "message": "mock upstream failure",
                    "status": "UNAVAILABLE"
                }
            })),
        )
            .into_response();
    }

    let Some((model, method)) = call.split_once(':') else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match method {
        "generateContent" if state.blocked => Json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .into_response(),
        "generateContent" => Json(text_response(&state.text)).into_response(),
        "streamGenerateContent" => {
            let events: String = state
                .chunks
                .iter()
                .map(|chunk| format!("data: {}\n\n", text_response(chunk)))
                .collect();

            ([(header::CONTENT_TYPE, "text/event-stream")], Body::from(events)).into_response()
        }
        "predict" => Json(json!({
            "predictions": [{
                "bytesBase64Encoded": STANDARD.encode(IMAGE_BYTES),
                "mimeType": "image/png"
            }]
        }))
        .into_response(),
        "predictLongRunning" => Json(json!({
            "name": format!("models/{model}/operations/op-1"),
            "done": false
        }))
        .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_operation(
    State(state): State<Arc<MockState>>,
    Path((model, operation)): Path<(String, String)>,
) -> Json<Value> {
    let polls = state.poll_count.fetch_add(1, Ordering::Relaxed) + 1;
    let name = format!("models/{model}/operations/{operation}");

    if polls < state.polls_until_done {
        return Json(json!({ "name": name, "done": false }));
    }

    Json(json!({
        "name": name,
        "done": true,
        "response": {
            "generateVideoResponse": {
                "generatedSamples": [{
                    "video": { "uri": format!("http://{}/files/video.mp4", state.addr) }
                }]
            }
        }
    }))
}

async fn handle_video_file() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "video/mp4")], VIDEO_BYTES)
}

async fn handle_photo() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/jpeg")], PHOTO_BYTES)
}

fn text_response(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{ "text": text }]
            },
            "finishReason": "STOP"
        }]
    })
}
