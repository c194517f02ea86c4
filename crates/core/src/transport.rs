use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{
    config::{ClientConfig, UploadEncoding},
    error::{ClientError, RemoteAnalysisError, TransportError},
    types::{
        AnalysisOptionsResponse, AnalysisRequest, AnalysisResult, ApiInfo, Base64AnalysisRequest,
        ErrorBody, HealthStatus, OptionInfo,
    },
};

/// Calls the backend makes on behalf of the options provider and the controller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_options(&self) -> Result<BTreeMap<String, OptionInfo>, ClientError>;

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ClientError>;

    async fn health(&self) -> Result<HealthStatus, ClientError>;
}

/// reqwest-backed transport with a fixed base address and a long timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /`
    pub async fn api_info(&self) -> Result<ApiInfo, ClientError> {
        let response = self.client.get(self.config.endpoint("/")).send().await?;
        decode(response).await
    }

    /// Upload as multipart form data to `/analyze-video-file`.
    #[instrument(skip_all, fields(file = request.file.name(), analysis_type = %request.analysis_type))]
    pub async fn analyze_multipart(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ClientError> {
        let part = Part::bytes(request.file.data().to_vec())
            .file_name(request.file.name().to_string())
            .mime_str(request.file.mime_type())?;

        let mut form = Form::new()
            .part("file", part)
            .text("analysis_type", request.analysis_type.clone());
        if let Some(prompt) = &request.custom_prompt {
            form = form.text("custom_prompt", prompt.clone());
        }

        debug!(size = request.file.size(), "uploading video");
        let response = self
            .client
            .post(self.config.endpoint("/analyze-video-file"))
            .multipart(form)
            .send()
            .await?;

        decode(response).await
    }

    /// Send the video inline as base64 JSON to `/analyze-video`.
    #[instrument(skip_all, fields(file = request.file.name(), analysis_type = %request.analysis_type))]
    pub async fn analyze_base64(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ClientError> {
        let body = Base64AnalysisRequest {
            analysis_type: request.analysis_type.clone(),
            video_base64: base64::engine::general_purpose::STANDARD.encode(request.file.data()),
            mime_type: request.file.mime_type().to_string(),
            custom_prompt: request.custom_prompt.clone(),
        };

        debug!(size = request.file.size(), "sending inline video");
        let response = self
            .client
            .post(self.config.endpoint("/analyze-video"))
            .json(&body)
            .send()
            .await?;

        decode(response).await
    }

    /// Ask the backend to analyze a file on its own disk (`/analyze-video-from-path`).
    #[instrument(skip(self, custom_prompt))]
    pub async fn analyze_path(
        &self,
        video_path: &str,
        analysis_type: &str,
        custom_prompt: Option<&str>,
    ) -> Result<AnalysisResult, ClientError> {
        let mut fields = vec![("video_path", video_path), ("analysis_type", analysis_type)];
        if let Some(prompt) = custom_prompt {
            fields.push(("custom_prompt", prompt));
        }

        let response = self
            .client
            .post(self.config.endpoint("/analyze-video-from-path"))
            .form(&fields)
            .send()
            .await?;

        decode(response).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_options(&self) -> Result<BTreeMap<String, OptionInfo>, ClientError> {
        let response = self
            .client
            .get(self.config.endpoint("/analysis-options"))
            .send()
            .await?;
        let body: AnalysisOptionsResponse = decode(response).await?;
        Ok(body.analysis_options)
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ClientError> {
        match self.config.encoding {
            UploadEncoding::Multipart => self.analyze_multipart(request).await,
            UploadEncoding::Base64 => self.analyze_base64(request).await,
        }
    }

    async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(self.config.endpoint("/health")).send().await?;
        decode(response).await
    }
}

/// Decode a success body, or turn an error body into a remote/transport error.
///
/// Non-success responses surface their `detail`; without a decodable `detail`
/// they count as transport failures.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        let value = serde_json::from_slice(&body).map_err(TransportError::Decode)?;
        return Ok(value);
    }

    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(err) => Err(RemoteAnalysisError {
            status: Some(status.as_u16()),
            detail: err.message(),
        }
        .into()),
        Err(_) => Err(TransportError::UnexpectedStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        }
        .into()),
    }
}
