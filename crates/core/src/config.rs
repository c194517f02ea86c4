use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// AI inference on a whole video is slow; allow five minutes per call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// How the video travels to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadEncoding {
    /// `POST /analyze-video-file` as multipart form data
    #[default]
    Multipart,
    /// `POST /analyze-video` as JSON with a base64 body
    Base64,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub encoding: UploadEncoding,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_encoding(mut self, encoding: UploadEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Join an endpoint path onto the base address.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            encoding: UploadEncoding::default(),
        }
    }
}

/// Timing of the cosmetic progress indicator shown while a request is in flight.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    pub interval: Duration,
    pub ceiling: u8,
    pub max_step: u8,
    pub reset_delay: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            ceiling: 90,
            max_step: 15,
            reset_delay: Duration::from_secs(1),
        }
    }
}
