//! video-interpreter core library
//!
//! Client side of the video interpreter: transport to the backend, the
//! analysis-options catalog, the upload surface, the request lifecycle
//! controller and result rendering. Also holds the wire types the backend
//! serves.

pub mod config;
pub mod controller;
pub mod error;
pub mod format;
pub mod media;
pub mod options;
pub mod render;
pub mod transport;
pub mod types;
pub mod upload;

// Re-export commonly used items at crate root
pub use config::{ClientConfig, ProgressConfig, UploadEncoding};
pub use controller::{ControllerState, LifecycleController, LifecycleState};
pub use error::{
    ClientError, InterpreterError, OptionsFetchError, RemoteAnalysisError, Result, TransportError,
    ValidationError,
};
pub use format::{format_duration, format_file_size};
pub use media::{is_video_mime, mime_from_extension};
pub use options::{OptionsCatalog, fetch_options};
pub use render::{COPY_CONFIRMATION, CopyConfirmation, Paragraph, paragraphs, render_plain};
pub use transport::{HttpTransport, Transport};
pub use types::{
    AnalysisOption, AnalysisOptionsResponse, AnalysisRequest, AnalysisResult, ApiInfo,
    Base64AnalysisRequest, CUSTOM_ANALYSIS, ErrorBody, HealthStatus, OptionInfo, SelectedFile,
};
pub use upload::{FileSummary, UploadSurface};
