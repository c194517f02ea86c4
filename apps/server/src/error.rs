use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use video_interpreter_core::ErrorBody;

/// Request failures answered with a non-2xx status and `{"detail": ...}`.
///
/// Model failures are not here: those are reported in a 200 body with
/// `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid analysis_type. Choose from: {choices}")]
    InvalidAnalysisType { choices: String },

    #[error("custom_prompt is required when analysis_type is 'custom'")]
    MissingCustomPrompt,

    #[error("Video file too large. Maximum size is {max_mb}MB")]
    PayloadTooLarge { max_mb: usize },

    #[error("Video file not found")]
    VideoNotFound,

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidAnalysisType { .. }
            | ApiError::MissingCustomPrompt
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::VideoNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
