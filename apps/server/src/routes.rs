use std::{collections::BTreeMap, path::Path, sync::Arc};

use axum::{
    Form, Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;
use video_interpreter_core::{
    AnalysisOptionsResponse, AnalysisResult, ApiInfo, Base64AnalysisRequest, HealthStatus,
    media::FALLBACK_VIDEO_MIME, mime_from_extension,
};

use crate::{
    catalog::{self, ResolvedPrompt},
    error::ApiError,
    gemini::VideoAnalyzer,
};

/// Room for multipart framing and base64 growth on top of the raw video limit.
const BODY_OVERHEAD: usize = 1024 * 1024;

pub struct AppState {
    analyzer: Arc<dyn VideoAnalyzer>,
    max_upload_mb: usize,
}

impl AppState {
    pub fn new(analyzer: Arc<dyn VideoAnalyzer>, max_upload_mb: usize) -> Self {
        Self {
            analyzer,
            max_upload_mb,
        }
    }

    fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }

    fn check_size(&self, len: usize) -> Result<(), ApiError> {
        if len > self.max_upload_bytes() {
            warn!(len, max = self.max_upload_bytes(), "upload too large");
            return Err(self.too_large());
        }
        Ok(())
    }

    fn too_large(&self) -> ApiError {
        ApiError::PayloadTooLarge {
            max_mb: self.max_upload_mb,
        }
    }

    fn rejected(&self, status: StatusCode, text: String) -> ApiError {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            self.too_large()
        } else {
            ApiError::BadRequest(text)
        }
    }

    fn multipart_error(&self, err: MultipartError) -> ApiError {
        self.rejected(err.status(), err.body_text())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes() / 3 * 4 + BODY_OVERHEAD;

    Router::new()
        .route("/", get(root))
        .route("/analysis-options", get(analysis_options))
        .route("/health", get(health))
        .route("/analyze-video-file", post(analyze_video_file))
        .route("/analyze-video", post(analyze_video))
        .route("/analyze-video-from-path", post(analyze_video_from_path))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<ApiInfo> {
    let endpoints = BTreeMap::from([
        ("analyze".to_string(), "/analyze-video-file".to_string()),
        ("analyze_base64".to_string(), "/analyze-video".to_string()),
        (
            "analyze_from_path".to_string(),
            "/analyze-video-from-path".to_string(),
        ),
        ("options".to_string(), "/analysis-options".to_string()),
        ("health".to_string(), "/health".to_string()),
    ]);

    Json(ApiInfo {
        message: "AI Video Interpreter API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

async fn analysis_options() -> Json<AnalysisOptionsResponse> {
    Json(catalog::options_response())
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        message: "AI Video Interpreter is healthy".to_string(),
    })
}

async fn analyze_video_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let mut multipart = multipart.map_err(|r| state.rejected(r.status(), r.body_text()))?;
    let mut upload = None;
    let mut analysis_type = None;
    let mut custom_prompt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| state.multipart_error(e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| state.multipart_error(e))?;
                upload = Some((file_name, data));
            }
            "analysis_type" => {
                analysis_type = Some(field.text().await.map_err(|e| state.multipart_error(e))?);
            }
            "custom_prompt" => {
                custom_prompt = Some(field.text().await.map_err(|e| state.multipart_error(e))?);
            }
            _ => {}
        }
    }

    let analysis_type =
        analysis_type.ok_or_else(|| ApiError::BadRequest("analysis_type is required".into()))?;
    let resolved = catalog::resolve(&analysis_type, custom_prompt.as_deref())?;
    let (file_name, data) =
        upload.ok_or_else(|| ApiError::BadRequest("file is required".into()))?;
    state.check_size(data.len())?;

    let mime_type = mime_from_extension(&file_name).unwrap_or(FALLBACK_VIDEO_MIME);
    Ok(Json(run(&state, resolved, mime_type, &data).await))
}

async fn analyze_video(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Base64AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(body) = payload.map_err(|r| state.rejected(r.status(), r.body_text()))?;
    let resolved = catalog::resolve(&body.analysis_type, body.custom_prompt.as_deref())?;

    let video = STANDARD
        .decode(body.video_base64.trim())
        .map_err(|e| ApiError::BadRequest(format!("Invalid video_base64: {}", e)))?;
    state.check_size(video.len())?;

    let mime_type = match body.mime_type.trim() {
        "" => FALLBACK_VIDEO_MIME,
        mime => mime,
    };
    Ok(Json(run(&state, resolved, mime_type, &video).await))
}

#[derive(Debug, Deserialize)]
struct PathAnalysisForm {
    video_path: String,
    analysis_type: String,
    #[serde(default)]
    custom_prompt: Option<String>,
}

async fn analyze_video_from_path(
    State(state): State<Arc<AppState>>,
    form: Result<Form<PathAnalysisForm>, FormRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Form(form) = form.map_err(|r| state.rejected(r.status(), r.body_text()))?;
    let resolved = catalog::resolve(&form.analysis_type, form.custom_prompt.as_deref())?;

    let path = Path::new(&form.video_path);
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(ApiError::VideoNotFound);
    }

    let mime_type = mime_from_extension(path).unwrap_or(FALLBACK_VIDEO_MIME);
    let result = match tokio::fs::read(path).await {
        Ok(video) => run(&state, resolved, mime_type, &video).await,
        Err(err) => {
            error!(path = %path.display(), error = %err, "could not read video");
            failed(resolved, err.to_string())
        }
    };
    Ok(Json(result))
}

async fn run(
    state: &AppState,
    resolved: ResolvedPrompt,
    mime_type: &str,
    video: &[u8],
) -> AnalysisResult {
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        analysis_type = %resolved.analysis_type,
        mime_type,
        size = video.len(),
        "analyzing video"
    );

    match state
        .analyzer
        .analyze(&resolved.prompt, mime_type, video)
        .await
    {
        Ok(text) => {
            info!(%request_id, chars = text.len(), "analysis complete");
            AnalysisResult::success(resolved.analysis_type, resolved.description, text)
        }
        Err(err) => {
            error!(%request_id, error = %err, "analysis failed");
            failed(resolved, err.to_string())
        }
    }
}

/// Model-side failures still answer 200, with the error in the body.
fn failed(resolved: ResolvedPrompt, error: String) -> AnalysisResult {
    AnalysisResult {
        success: false,
        result: Some(String::new()),
        analysis_type: Some(resolved.analysis_type),
        analysis_description: Some(resolved.description),
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::gemini::AnalyzerError;

    const BOUNDARY: &str = "XVIDEOINTERPRETERX";

    #[derive(Default)]
    struct FakeAnalyzer {
        fail_with: Option<String>,
        calls: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl VideoAnalyzer for FakeAnalyzer {
        async fn analyze(
            &self,
            prompt: &str,
            mime_type: &str,
            video: &[u8],
        ) -> Result<String, AnalyzerError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), mime_type.to_string(), video.len()));
            match &self.fail_with {
                Some(message) => Err(AnalyzerError::Api {
                    status: 503,
                    message: message.clone(),
                }),
                None => Ok("Line1\n\nLine2".to_string()),
            }
        }
    }

    fn app(analyzer: Arc<FakeAnalyzer>, max_upload_mb: usize) -> Router {
        router(Arc::new(AppState::new(analyzer, max_upload_mb)))
    }

    fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/analyze-video-file")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn options_list_every_builtin_type() {
        let request = Request::get("/analysis-options").body(Body::empty()).unwrap();
        let (status, body) = send(app(Arc::default(), 50), request).await;

        assert_eq!(status, StatusCode::OK);
        let options = body["analysis_options"].as_object().unwrap();
        assert_eq!(options.len(), 7);
        assert_eq!(
            options["custom"]["description"],
            "Custom analysis based on user input"
        );
        assert!(body["usage"].as_str().unwrap().contains("analysis_type"));
    }

    #[tokio::test]
    async fn upload_is_analyzed_with_the_type_prompt() {
        let analyzer = Arc::new(FakeAnalyzer::default());
        let request = multipart(
            &[("analysis_type", "bullet_summary")],
            Some(("clip.MOV", b"movie")),
        );

        let (status, body) = send(app(analyzer.clone(), 50), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["result"], "Line1\n\nLine2");
        assert_eq!(body["analysis_type"], "bullet_summary");

        let calls = analyzer.calls.lock().unwrap();
        let (prompt, mime, len) = &calls[0];
        assert!(prompt.starts_with("Summarize this video in a few short bullets"));
        assert_eq!(mime, "video/quicktime");
        assert_eq!(*len, 5);
    }

    #[tokio::test]
    async fn unknown_extension_falls_back_to_mp4() {
        let analyzer = Arc::new(FakeAnalyzer::default());
        let request = multipart(
            &[("analysis_type", "custom"), ("custom_prompt", "Count the cats")],
            Some(("recording.bin", b"data")),
        );

        let (status, _) = send(app(analyzer.clone(), 50), request).await;

        assert_eq!(status, StatusCode::OK);
        let calls = analyzer.calls.lock().unwrap();
        assert_eq!(calls[0].0, "Count the cats");
        assert_eq!(calls[0].1, "video/mp4");
    }

    #[tokio::test]
    async fn unknown_type_is_rejected_before_analysis() {
        let analyzer = Arc::new(FakeAnalyzer::default());
        let request = multipart(&[("analysis_type", "haiku")], Some(("clip.mp4", b"x")));

        let (status, body) = send(app(analyzer.clone(), 50), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .starts_with("Invalid analysis_type. Choose from: [")
        );
        assert!(analyzer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn custom_type_without_prompt_is_rejected() {
        let request = multipart(&[("analysis_type", "custom")], Some(("clip.mp4", b"x")));

        let (status, body) = send(app(Arc::default(), 50), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "custom_prompt is required when analysis_type is 'custom'"
        );
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected() {
        let analyzer = Arc::new(FakeAnalyzer::default());
        let video = vec![0u8; 1024 * 1024 + 1];
        let request = multipart(
            &[("analysis_type", "detailed_summary")],
            Some(("big.mp4", &video)),
        );

        let (status, body) = send(app(analyzer.clone(), 1), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["detail"], "Video file too large. Maximum size is 1MB");
        assert!(analyzer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_reported_in_a_200_body() {
        let analyzer = Arc::new(FakeAnalyzer {
            fail_with: Some("model unavailable".to_string()),
            ..Default::default()
        });
        let request = multipart(
            &[("analysis_type", "technical_analysis")],
            Some(("clip.webm", b"webm")),
        );

        let (status, body) = send(app(analyzer, 50), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["result"], "");
        assert_eq!(body["error"], "Gemini returned 503: model unavailable");
    }

    #[tokio::test]
    async fn base64_body_is_decoded() {
        let analyzer = Arc::new(FakeAnalyzer::default());
        let payload = json!({
            "analysis_type": "object_identification",
            "video_base64": STANDARD.encode(b"inline video"),
            "mime_type": "video/webm",
        });
        let request = Request::post("/analyze-video")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = send(app(analyzer.clone(), 50), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let calls = analyzer.calls.lock().unwrap();
        assert_eq!(calls[0].1, "video/webm");
        assert_eq!(calls[0].2, b"inline video".len());
    }

    #[tokio::test]
    async fn invalid_base64_is_a_bad_request() {
        let payload = json!({
            "analysis_type": "bullet_summary",
            "video_base64": "not base64 at all!",
            "mime_type": "video/mp4",
        });
        let request = Request::post("/analyze-video")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = send(app(Arc::default(), 50), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid video_base64"));
    }

    #[tokio::test]
    async fn non_multipart_upload_gets_a_detail() {
        let analyzer = Arc::new(FakeAnalyzer::default());
        let request = Request::post("/analyze-video-file")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"analysis_type":"bullet_summary"}"#))
            .unwrap();

        let (status, body) = send(app(analyzer.clone(), 50), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["detail"].as_str().unwrap().is_empty());
        assert!(analyzer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let request = Request::post("/analyze-video-from-path")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "video_path=%2Fnowhere%2Fmissing.mp4&analysis_type=bullet_summary",
            ))
            .unwrap();

        let (status, body) = send(app(Arc::default(), 50), request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Video file not found");
    }

    #[tokio::test]
    async fn existing_path_is_read_and_analyzed() {
        let path = std::env::temp_dir().join(format!("vinterp-{}.mkv", Uuid::new_v4()));
        tokio::fs::write(&path, b"matroska").await.unwrap();
        let analyzer = Arc::new(FakeAnalyzer::default());
        let form = format!(
            "video_path={}&analysis_type=timestamped_summary",
            path.display().to_string().replace('/', "%2F")
        );
        let request = Request::post("/analyze-video-from-path")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();

        let (status, body) = send(app(analyzer.clone(), 50), request).await;
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis_type"], "timestamped_summary");
        let calls = analyzer.calls.lock().unwrap();
        assert_eq!(calls[0].1, "video/x-matroska");
        assert_eq!(calls[0].2, 8);
    }

    #[tokio::test]
    async fn health_and_root_answer() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(Arc::default(), 50), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let request = Request::get("/").body(Body::empty()).unwrap();
        let (_, body) = send(app(Arc::default(), 50), request).await;
        assert_eq!(body["endpoints"]["analyze"], "/analyze-video-file");
    }
}
