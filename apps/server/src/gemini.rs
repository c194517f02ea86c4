use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::config::ServerConfig;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const SYSTEM_INSTRUCTION: &str =
    "You are an expert video analyst. Analyze videos carefully and provide detailed descriptions.";

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("Missing API key: set {env_var}")]
    MissingApiKey { env_var: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid API response: {reason}")]
    InvalidResponse { reason: String },
}

/// Something that turns a prompt plus a video into text.
#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        prompt: &str,
        mime_type: &str,
        video: &[u8],
    ) -> Result<String, AnalyzerError>;
}

/// Validate that the API key is set
pub fn validate_api_key() -> Result<String, AnalyzerError> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or(AnalyzerError::MissingApiKey {
            env_var: API_KEY_ENV,
        })
}

pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiAnalyzer {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    /// Build from server config and `GEMINI_API_KEY`. Fails if the key is unset.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AnalyzerError> {
        let api_key = validate_api_key()?;
        Ok(Self::new(
            api_key,
            config.model.clone(),
            config.gemini_base_url.clone(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl VideoAnalyzer for GeminiAnalyzer {
    #[instrument(skip(self, prompt, video), fields(model = %self.model, size = video.len()))]
    async fn analyze(
        &self,
        prompt: &str,
        mime_type: &str,
        video: &[u8],
    ) -> Result<String, AnalyzerError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "system_instruction": {
                    "parts": [{"text": SYSTEM_INSTRUCTION}],
                },
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": prompt},
                        {"inline_data": {"mime_type": mime_type, "data": STANDARD.encode(video)}},
                    ],
                }],
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "gemini responded");

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(AnalyzerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: Value =
            serde_json::from_str(&body).map_err(|e| AnalyzerError::InvalidResponse {
                reason: e.to_string(),
            })?;
        extract_text(&response)
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: &Value) -> Result<String, AnalyzerError> {
    let parts = response["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| AnalyzerError::InvalidResponse {
            reason: match response["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => format!("prompt blocked: {}", reason),
                None => "no candidates in response".to_string(),
            },
        })?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        return Err(AnalyzerError::InvalidResponse {
            reason: "empty response".to_string(),
        });
    }
    Ok(text)
}
