//! Integration tests: submit, poll, download, failure paths.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::util::ServiceExt;
use vox_api::layout::DataLayout;
use vox_api::server::{self, AppState};
use vox_convert::{CopyMerger, Device, MockModelLoader, ToneColorAdapter};
use vox_fetch::HttpAudioFetcher;
use vox_scheduler::{IdProvider, InMemoryJobStore, InMemoryScheduler, Pipeline, TimestampIdGenerator};
use vox_types::{ConvertError, VoiceConverter};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct SequentialIds {
    next: AtomicUsize,
}

impl IdProvider for SequentialIds {
    fn next_id(&self) -> String {
        format!("job-{}", self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Converter that waits for a signal before copying input to output.
struct GatedConverter {
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl VoiceConverter for GatedConverter {
    async fn process_audio(
        &self,
        input: &Path,
        _target: &Path,
        output: &Path,
    ) -> Result<(), ConvertError> {
        self.gate.notified().await;
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

fn app_with(
    converter: Arc<dyn VoiceConverter>,
    ids: Arc<dyn IdProvider>,
) -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let layout = DataLayout::new(dir.path().join("data"));
    let pipeline = Arc::new(Pipeline::new(
        converter,
        Arc::new(CopyMerger::new()),
        layout.processed(),
    ));
    let scheduler = Arc::new(InMemoryScheduler::new(
        Arc::new(InMemoryJobStore::new()),
        pipeline,
        2,
    ));
    let state = Arc::new(AppState {
        scheduler,
        fetcher: Arc::new(HttpAudioFetcher::new()),
        ids,
        layout,
    });
    (server::router(state), dir)
}

fn test_app() -> (axum::Router, tempfile::TempDir) {
    app_with(
        Arc::new(ToneColorAdapter::new(
            Arc::new(MockModelLoader::new()),
            Device::Cpu,
        )),
        Arc::new(TimestampIdGenerator::new()),
    )
}

async fn audio_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"clone-voice".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"original-content".to_vec()))
        .mount(&server)
        .await;
    server
}

async fn submit(app: &axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/test/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let j = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, j)
}

async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn status_of(app: &axum::Router, id: &str) -> serde_json::Value {
    let res = get(app, &format!("/api/v1/status/{}", id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn wait_terminal(app: &axum::Router, id: &str) -> serde_json::Value {
    for _ in 0..100 {
        let j = status_of(app, id).await;
        let status = j["status"].as_str().unwrap_or("");
        assert_ne!(status, "Not Found", "submitted job vanished");
        if status == "Completed" || status == "Failed" {
            return j;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

#[tokio::test]
async fn submit_poll_then_download() {
    let server = audio_server().await;
    let (app, _dir) = test_app();
    let (code, j) = submit(
        &app,
        json!({
            "clone_audio_url": format!("{}/a.wav", server.uri()),
            "original_audio_url": format!("{}/b.wav", server.uri()),
        }),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(j["status"], "Processing started");
    let id = j["audio_id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 20);
    assert!(id.chars().all(|c| c.is_ascii_digit()));

    let done = wait_terminal(&app, &id).await;
    assert_eq!(done["video_id"], id.as_str());
    assert_eq!(done["status"], "Completed");
    assert!(done.get("error").is_none());

    // Terminal state is stable.
    assert_eq!(status_of(&app, &id).await["status"], "Completed");

    let res = get(&app, &format!("/api/v1/download-final-video/{}", id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "audio/mpeg");
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&format!("{}.mp3", id)));
    assert_eq!(res.headers()["content-length"], "16");
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"original-content");

    // The file is served from disk, so byte ranges work too.
    let req = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/download-final-video/{}", id))
        .header("range", "bytes=0-7")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()["content-type"], "audio/mpeg");
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"original");
}

#[tokio::test]
async fn failed_download_is_synchronous_500_without_job() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.wav"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;
    let ids = Arc::new(SequentialIds {
        next: AtomicUsize::new(0),
    });
    let (app, dir) = app_with(
        Arc::new(ToneColorAdapter::new(
            Arc::new(MockModelLoader::new()),
            Device::Cpu,
        )),
        ids,
    );
    let (code, j) = submit(
        &app,
        json!({
            "clone_audio_url": format!("{}/a.wav", server.uri()),
            "original_audio_url": format!("{}/b.wav", server.uri()),
        }),
    )
    .await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(j["detail"].as_str().unwrap().contains("404"));

    // The id allocated for the attempt was never registered.
    assert_eq!(status_of(&app, "job-0").await["status"], "Not Found");
    assert!(!dir
        .path()
        .join("data")
        .join("downloaded_audios")
        .join("job-0")
        .exists());
}

#[tokio::test]
async fn second_download_failure_removes_first_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"clone-voice".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.wav"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (app, dir) = app_with(
        Arc::new(ToneColorAdapter::new(
            Arc::new(MockModelLoader::new()),
            Device::Cpu,
        )),
        Arc::new(SequentialIds {
            next: AtomicUsize::new(0),
        }),
    );
    let (code, j) = submit(
        &app,
        json!({
            "clone_audio_url": format!("{}/a.wav", server.uri()),
            "original_audio_url": format!("{}/b.wav", server.uri()),
        }),
    )
    .await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(j["detail"].as_str().unwrap().contains("500"));

    // a.wav landed before b.wav failed; the whole job dir is gone.
    assert!(!dir
        .path()
        .join("data")
        .join("downloaded_audios")
        .join("job-0")
        .exists());
    assert_eq!(status_of(&app, "job-0").await["status"], "Not Found");
}

#[tokio::test]
async fn unreachable_url_is_500() {
    let (app, _dir) = test_app();
    let (code, j) = submit(
        &app,
        json!({
            "clone_audio_url": "http://127.0.0.1:1/a.wav",
            "original_audio_url": "http://127.0.0.1:1/b.wav",
        }),
    )
    .await;
    assert_eq!(code, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(j["detail"].is_string());
}

#[tokio::test]
async fn unknown_id_reports_not_found() {
    let (app, _dir) = test_app();
    let j = status_of(&app, "20000101000000000000").await;
    assert_eq!(j["video_id"], "20000101000000000000");
    assert_eq!(j["status"], "Not Found");

    let res = get(&app, "/api/v1/download-final-video/20000101000000000000").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_before_completion_is_404() {
    let server = audio_server().await;
    let gate = Arc::new(Notify::new());
    let (app, _dir) = app_with(
        Arc::new(GatedConverter { gate: gate.clone() }),
        Arc::new(TimestampIdGenerator::new()),
    );
    let (code, j) = submit(
        &app,
        json!({
            "clone_audio_url": format!("{}/a.wav", server.uri()),
            "original_audio_url": format!("{}/b.wav", server.uri()),
        }),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    let id = j["audio_id"].as_str().unwrap().to_string();

    assert_eq!(status_of(&app, &id).await["status"], "Processing");
    let res = get(&app, &format!("/api/v1/download-final-video/{}", id)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["detail"], "Audio not found");

    gate.notify_one();
    assert_eq!(wait_terminal(&app, &id).await["status"], "Completed");
    let res = get(&app, &format!("/api/v1/download-final-video/{}", id)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn conversion_failure_is_reported_with_detail() {
    let server = audio_server().await;
    let (app, _dir) = app_with(
        Arc::new(ToneColorAdapter::new(
            Arc::new(MockModelLoader::failing_conversions()),
            Device::Cpu,
        )),
        Arc::new(TimestampIdGenerator::new()),
    );
    let (code, j) = submit(
        &app,
        json!({
            "clone_audio_url": format!("{}/a.wav", server.uri()),
            "original_audio_url": format!("{}/b.wav", server.uri()),
        }),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    let id = j["audio_id"].as_str().unwrap().to_string();

    let done = wait_terminal(&app, &id).await;
    assert_eq!(done["status"], "Failed");
    assert_eq!(done["error"]["kind"], "conversion");
    assert!(done["error"]["message"]
        .as_str()
        .unwrap()
        .contains("mock conversion failed"));

    let res = get(&app, &format!("/api/v1/download-final-video/{}", id)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rapid_submissions_get_distinct_ids() {
    let server = audio_server().await;
    let (app, _dir) = test_app();
    let body = json!({
        "clone_audio_url": format!("{}/a.wav", server.uri()),
        "original_audio_url": format!("{}/b.wav", server.uri()),
    });
    let (a, b) = tokio::join!(submit(&app, body.clone()), submit(&app, body));
    let id_a = a.1["audio_id"].as_str().unwrap().to_string();
    let id_b = b.1["audio_id"].as_str().unwrap().to_string();
    assert_ne!(id_a, id_b);
    assert_eq!(wait_terminal(&app, &id_a).await["status"], "Completed");
    assert_eq!(wait_terminal(&app, &id_b).await["status"], "Completed");
}

#[tokio::test]
async fn missing_field_is_rejected_before_download() {
    let (app, _dir) = test_app();
    let (code, _) = submit(&app, json!({ "clone_audio_url": "http://x/a.wav" })).await;
    assert!(code.is_client_error());
}

#[tokio::test]
async fn unsafe_download_id_is_404() {
    let (app, _dir) = test_app();
    let res = get(&app, "/api/v1/download-final-video/..%2F..%2Fetc").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn root_redirects_and_metrics_placeholder() {
    let (app, _dir) = test_app();
    let res = get(&app, "/").await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(res.headers()["location"], "/docs");

    let res = get(&app, "/docs").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = get(&app, "/metrics").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let j: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(j["message"], "Metrics not implemented");

    let res = get(&app, "/health").await;
    assert_eq!(res.status(), StatusCode::OK);
}
