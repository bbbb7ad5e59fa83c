//! Axum server and routes.

use crate::layout::{is_safe_id, DataLayout, OUTPUT_CONTENT_TYPE};
use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use vox_fetch::file_name_for;
use vox_scheduler::{IdProvider, Scheduler};
use vox_types::{
    AudioFetcher, CloneRequest, ErrorResponse, FetchError, JobInput, JobState, StatusResponse,
    SubmitResponse,
};

pub struct AppState {
    pub scheduler: Arc<dyn Scheduler + Send + Sync>,
    pub fetcher: Arc<dyn AudioFetcher + Send + Sync>,
    pub ids: Arc<dyn IdProvider>,
    pub layout: DataLayout,
}

pub fn router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route("/test/", post(handle_submit))
        .route("/test", post(handle_submit))
        .route("/status/:id", get(handle_status))
        .route("/download-final-video/:id", get(handle_download));
    Router::new()
        .nest("/api/v1", v1)
        .route("/", get(handle_root))
        .route("/docs", get(handle_docs))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error reply with a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn internal(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.into(),
        }
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            detail: self.detail,
        });
        (self.status, body).into_response()
    }
}

async fn download_inputs(
    state: &AppState,
    req: &CloneRequest,
    job_id: &str,
) -> Result<JobInput, FetchError> {
    let dir = state.layout.download_dir(job_id);
    let clone_audio = state
        .fetcher
        .fetch(
            &req.clone_audio_url,
            &dir,
            &file_name_for("clone", &req.clone_audio_url),
        )
        .await?;
    let original_audio = state
        .fetcher
        .fetch(
            &req.original_audio_url,
            &dir,
            &file_name_for("original", &req.original_audio_url),
        )
        .await?;
    Ok(JobInput {
        job_id: job_id.to_string(),
        clone_audio,
        original_audio,
        output_path: state.layout.output_path(job_id),
    })
}

async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CloneRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    tracing::info!(
        clone_audio_url = %req.clone_audio_url,
        original_audio_url = %req.original_audio_url,
        "clone request received"
    );
    let job_id = state.ids.next_id();
    let input = match download_inputs(&state, &req, &job_id).await {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(error = %e, "download failed, job not created");
            let _ = tokio::fs::remove_dir_all(state.layout.download_dir(&job_id)).await;
            return Err(ApiError::internal(e.to_string()));
        }
    };
    tracing::info!(
        job_id = %job_id,
        clone_audio = %input.clone_audio.display(),
        original_audio = %input.original_audio.display(),
        output = %input.output_path.display(),
        "inputs downloaded"
    );
    let job = state.scheduler.submit(input).await.map_err(|e| {
        tracing::error!(job_id = %job_id, error = %e, "job submission failed");
        ApiError::internal(e.to_string())
    })?;
    Ok(Json(SubmitResponse::started(job.job_id)))
}

async fn handle_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let job = state
        .scheduler
        .get_status(&id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(StatusResponse::from_lookup(id, job.as_ref())))
}

async fn handle_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    const MISSING: &str = "Audio not found";
    if !is_safe_id(&id) {
        return Err(ApiError::not_found(MISSING));
    }
    let job = state
        .scheduler
        .get_status(&id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !matches!(job, Some(ref j) if j.state == JobState::Completed) {
        return Err(ApiError::not_found(MISSING));
    }

    // ServeFile streams the file from disk in chunks.
    let served = ServeFile::new(state.layout.output_path(&id))
        .oneshot(request)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if served.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::not_found(MISSING));
    }
    let mut res = served.map(Body::new);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        DataLayout::output_file_name(&id)
    );
    let disposition =
        HeaderValue::from_str(&disposition).map_err(|e| ApiError::internal(e.to_string()))?;
    let headers = res.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(OUTPUT_CONTENT_TYPE),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(res)
}

async fn handle_root() -> Redirect {
    Redirect::temporary("/docs")
}

const DOCS_HTML: &str = r#"<!doctype html>
<html>
<head><title>Voice clone API</title></head>
<body>
<h1>Voice clone API</h1>
<ul>
<li><code>POST /api/v1/test/</code> body <code>{"clone_audio_url": "...", "original_audio_url": "..."}</code> returns <code>{"audio_id", "status"}</code></li>
<li><code>GET /api/v1/status/{id}</code> returns <code>{"video_id", "status", "error"?}</code>; status is Processing, Completed, Failed or Not Found</li>
<li><code>GET /api/v1/download-final-video/{id}</code> returns the converted <code>audio/mpeg</code> file once the job is Completed</li>
<li><code>GET /metrics</code>, <code>GET /health</code></li>
</ul>
</body>
</html>
"#;

async fn handle_docs() -> Html<&'static str> {
    Html(DOCS_HTML)
}

async fn handle_metrics() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Metrics not implemented" }))
}

async fn handle_health() -> &'static str {
    "ok"
}
