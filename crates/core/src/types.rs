use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Analysis type that takes its prompt from the user.
pub const CUSTOM_ANALYSIS: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub description: String,
}

/// Body of `GET /analysis-options`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisOptionsResponse {
    pub analysis_options: BTreeMap<String, OptionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

/// One selectable analysis type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOption {
    pub key: String,
    pub description: String,
}

impl AnalysisOption {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }

    /// Human label derived from the key, e.g. `bullet_summary` -> `Bullet Summary`
    pub fn label(&self) -> String {
        self.key
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_custom(&self) -> bool {
        self.key == CUSTOM_ANALYSIS
    }
}

impl fmt::Display for AnalysisOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// The one video picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// A validated request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub file: SelectedFile,
    pub analysis_type: String,
    pub custom_prompt: Option<String>,
}

impl AnalysisRequest {
    /// Check the inputs and build a request.
    ///
    /// The custom prompt is only kept for the `custom` analysis type, trimmed.
    pub fn build(
        file: Option<&SelectedFile>,
        analysis_type: &str,
        custom_prompt: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let file = file.ok_or(ValidationError::MissingFile)?;
        if file.is_empty() {
            return Err(ValidationError::EmptyFile);
        }

        let analysis_type = analysis_type.trim();
        if analysis_type.is_empty() {
            return Err(ValidationError::MissingAnalysisType);
        }

        let custom_prompt = if analysis_type == CUSTOM_ANALYSIS {
            let prompt = custom_prompt.map(str::trim).unwrap_or_default();
            if prompt.is_empty() {
                return Err(ValidationError::MissingCustomPrompt);
            }
            Some(prompt.to_string())
        } else {
            None
        };

        Ok(Self {
            file: file.clone(),
            analysis_type: analysis_type.to_string(),
            custom_prompt,
        })
    }
}

fn default_success() -> bool {
    true
}

/// Response of every analyze endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub analysis_type: Option<String>,
    #[serde(default)]
    pub analysis_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AnalysisResult {
    pub fn success(
        analysis_type: impl Into<String>,
        analysis_description: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            analysis_type: Some(analysis_type.into()),
            analysis_description: Some(analysis_description.into()),
            error: None,
        }
    }

    pub fn failure(analysis_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            analysis_type: Some(analysis_type.into()),
            analysis_description: None,
            error: Some(error.into()),
        }
    }

    /// Result text, empty when the analysis produced none.
    pub fn text(&self) -> &str {
        self.result.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /analyze-video`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Base64AnalysisRequest {
    pub analysis_type: String,
    pub video_base64: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

/// Body of every non-success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: serde_json::Value::String(detail.into()),
        }
    }

    /// `detail` as display text; structured details are rendered as JSON.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
}
