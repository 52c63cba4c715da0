mod harness;

use harness::config::ConfigBuilder;
use harness::mock_gemini::MockGemini;
use harness::server::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn playback_without_voice_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(ConfigBuilder::new(dir.path()).build()).await.unwrap();

    let requests = [
        ("/play", json!({ "guild_id": "1", "channel_id": "2", "query": "lofi" })),
        ("/skip", json!({ "guild_id": "1" })),
        ("/stop", json!({ "guild_id": "1" })),
    ];

    for (path, body) in requests {
        let resp = server.post_json(path, &body).await;
        assert_eq!(resp.status(), 503, "{path}");

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({ "error": "voice playback is not configured" }));
    }

    let resp = server.client().get(server.url("/queue/1")).send().await.unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(ConfigBuilder::new(dir.path()).build()).await.unwrap();

    let resp = server.post_json("/get-stream-url", &json!({ "query": "  " })).await;
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "query is required" }));
}

#[tokio::test]
async fn genai_routes_are_absent_without_a_key() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(ConfigBuilder::new(dir.path()).build()).await.unwrap();

    for path in ["/generate-text", "/generate-quiz", "/generate-image"] {
        let resp = server.post_json(path, &json!({ "prompt": "hi", "topic": "hi" })).await;
        assert_eq!(resp.status(), 404, "{path}");
    }
}

#[tokio::test]
async fn music_routes_are_absent_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mock = MockGemini::start().await.unwrap();
    let config = ConfigBuilder::new(dir.path())
        .with_gemini(&mock.base_url())
        .without_music()
        .build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server.post_json("/get-stream-url", &json!({ "query": "lofi" })).await;
    assert_eq!(resp.status(), 404);
}

#[cfg(unix)]
mod with_fake_ytdlp {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use super::*;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn stream_url_is_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            r#"echo '{"title": "Lofi Beats", "webpage_url": "https://www.youtube.com/watch?v=abc", "url": "https://cdn.example.com/audio.webm", "uploader": "Chill", "duration": 183.0}'"#,
        );
        let config = ConfigBuilder::new(dir.path()).with_ytdlp(&script).build();
        let server = TestServer::start(config).await.unwrap();

        let resp = server.post_json("/get-stream-url", &json!({ "query": "lofi beats" })).await;
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["stream_url"], "https://cdn.example.com/audio.webm");
        assert_eq!(body["title"], "Lofi Beats");
        assert_eq!(body["uploader"], "Chill");
        assert_eq!(body["duration"], 183.0);
    }

    #[tokio::test]
    async fn extractor_failure_is_a_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "echo 'ERROR: video unavailable' >&2\nexit 1");
        let config = ConfigBuilder::new(dir.path()).with_ytdlp(&script).build();
        let server = TestServer::start(config).await.unwrap();

        let resp = server.post_json("/get-stream-url", &json!({ "query": "lofi" })).await;
        assert_eq!(resp.status(), 502);
    }

    #[tokio::test]
    async fn no_result_is_a_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(dir.path(), "exit 0");
        let config = ConfigBuilder::new(dir.path()).with_ytdlp(&script).build();
        let server = TestServer::start(config).await.unwrap();

        let resp = server.post_json("/get-stream-url", &json!({ "query": "nothing" })).await;
        assert_eq!(resp.status(), 502);
    }
}
