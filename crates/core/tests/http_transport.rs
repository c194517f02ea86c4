use std::{collections::HashMap, sync::Arc};

use axum::{
    Form, Json, Router,
    extract::Multipart,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use base64::Engine as _;
use serde_json::json;
use video_interpreter_core::{
    AnalysisRequest, AnalysisResult, Base64AnalysisRequest, ClientConfig, ClientError,
    HttpTransport, LifecycleController, LifecycleState, OptionsCatalog, SelectedFile, Transport,
    TransportError, UploadEncoding, error::GENERIC_FAILURE_MESSAGE,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn options() -> Json<serde_json::Value> {
    Json(json!({
        "analysis_options": {
            "detailed_summary": {"description": "Give a detailed summary of this video."},
            "quiz_generation": {"description": "Create a quiz based on this video."}
        },
        "usage": "Use the key as analysis_type"
    }))
}

async fn echo_upload(mut multipart: Multipart) -> Json<AnalysisResult> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap().to_string();
            let mime = field.content_type().unwrap().to_string();
            let data = field.bytes().await.unwrap();
            fields.insert(name, format!("{}|{}|{}", file_name, mime, data.len()));
        } else {
            fields.insert(name, field.text().await.unwrap());
        }
    }

    let analysis_type = fields.remove("analysis_type").unwrap_or_default();
    let file = fields.remove("file").unwrap_or_default();
    let prompt = fields.remove("custom_prompt").unwrap_or_else(|| "-".into());
    Json(AnalysisResult::success(
        analysis_type,
        "echo",
        format!("{}\n\n{}", file, prompt),
    ))
}

async fn echo_inline(Json(body): Json<Base64AnalysisRequest>) -> Json<AnalysisResult> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body.video_base64)
        .unwrap();
    Json(AnalysisResult::success(
        body.analysis_type,
        "echo",
        format!("{}|{}", body.mime_type, bytes.len()),
    ))
}

async fn echo_path(Form(form): Form<HashMap<String, String>>) -> Json<AnalysisResult> {
    Json(AnalysisResult::success(
        form["analysis_type"].clone(),
        "echo",
        form["video_path"].clone(),
    ))
}

fn echo_router() -> Router {
    Router::new()
        .route("/analysis-options", get(options))
        .route("/analyze-video-file", post(echo_upload))
        .route("/analyze-video", post(echo_inline))
        .route("/analyze-video-from-path", post(echo_path))
        .route(
            "/",
            get(|| async {
                Json(json!({
                    "message": "AI Video Interpreter API",
                    "version": "0.1.0",
                    "endpoints": {"health": "/health"}
                }))
            }),
        )
        .route(
            "/health",
            get(|| async { Json(json!({"status": "healthy", "message": "ok"})) }),
        )
}

fn clip() -> SelectedFile {
    SelectedFile::new("clip.mp4", "video/mp4", vec![7u8; 4096])
}

#[tokio::test]
async fn options_catalog_exposes_exactly_the_served_entries() {
    let base = serve(echo_router()).await;
    let transport = HttpTransport::new(ClientConfig::new(base)).unwrap();

    let catalog = OptionsCatalog::load(&transport).await;

    let keys: Vec<&str> = catalog.options().iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["detailed_summary", "quiz_generation"]);
    assert!(catalog.notice().is_none());
    assert!(catalog.contains("quiz_generation"));
}

#[tokio::test]
async fn multipart_upload_carries_file_type_and_prompt() {
    let base = serve(echo_router()).await;
    let transport = HttpTransport::new(ClientConfig::new(base)).unwrap();
    let request = AnalysisRequest::build(Some(&clip()), "custom", Some("Describe the dog")).unwrap();

    let result = transport.analyze(&request).await.unwrap();

    assert!(result.success);
    assert_eq!(result.analysis_type.as_deref(), Some("custom"));
    assert_eq!(result.text(), "clip.mp4|video/mp4|4096\n\nDescribe the dog");
}

#[tokio::test]
async fn base64_encoding_goes_to_the_json_endpoint() {
    let base = serve(echo_router()).await;
    let config = ClientConfig::new(base).with_encoding(UploadEncoding::Base64);
    let transport = HttpTransport::new(config).unwrap();
    let request = AnalysisRequest::build(Some(&clip()), "bullet_summary", None).unwrap();

    let result = transport.analyze(&request).await.unwrap();

    assert_eq!(result.text(), "video/mp4|4096");
}

#[tokio::test]
async fn path_analysis_posts_a_form() {
    let base = serve(echo_router()).await;
    let transport = HttpTransport::new(ClientConfig::new(base)).unwrap();

    let result = transport
        .analyze_path("/srv/videos/demo.mov", "object_identification", None)
        .await
        .unwrap();

    assert_eq!(result.text(), "/srv/videos/demo.mov");
    assert_eq!(result.analysis_type.as_deref(), Some("object_identification"));
}

#[tokio::test]
async fn health_and_api_info_are_decoded() {
    let base = serve(echo_router()).await;
    let transport = HttpTransport::new(ClientConfig::new(base)).unwrap();

    let health = transport.health().await.unwrap();
    assert_eq!(health.status, "healthy");

    let info = transport.api_info().await.unwrap();
    assert_eq!(info.endpoints["health"], "/health");
}

#[tokio::test]
async fn server_error_detail_reaches_the_user() {
    let router = Router::new().route(
        "/analyze-video-file",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "model unavailable"})),
            )
                .into_response()
        }),
    );
    let base = serve(router).await;
    let transport = Arc::new(HttpTransport::new(ClientConfig::new(base)).unwrap());
    let controller = LifecycleController::new(transport);

    let result = controller
        .submit(Some(&clip()), "detailed_summary", None)
        .await
        .unwrap();

    assert!(!result.success);
    let state = controller.state();
    assert_eq!(state.phase, LifecycleState::Failed);
    assert_eq!(state.error.as_deref(), Some("model unavailable"));
}

#[tokio::test]
async fn error_without_detail_is_a_transport_failure() {
    let router = Router::new().route(
        "/analyze-video-file",
        post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response() }),
    );
    let base = serve(router).await;
    let transport = HttpTransport::new(ClientConfig::new(base)).unwrap();
    let request = AnalysisRequest::build(Some(&clip()), "detailed_summary", None).unwrap();

    let err = transport.analyze(&request).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Transport(TransportError::UnexpectedStatus { status: 502, .. })
    ));
}

#[tokio::test]
async fn unreachable_backend_ends_in_failed_with_generic_message() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport =
        Arc::new(HttpTransport::new(ClientConfig::new(format!("http://{}", addr))).unwrap());
    let controller = LifecycleController::new(transport.clone());

    let result = controller
        .submit(Some(&clip()), "detailed_summary", None)
        .await
        .unwrap();

    assert_eq!(result.error.as_deref(), Some("network error"));
    let state = controller.state();
    assert_eq!(state.phase, LifecycleState::Failed);
    assert_eq!(state.error.as_deref(), Some(GENERIC_FAILURE_MESSAGE));

    let catalog = OptionsCatalog::load(transport.as_ref()).await;
    assert!(catalog.is_empty());
    assert!(catalog.notice().is_some());
}
