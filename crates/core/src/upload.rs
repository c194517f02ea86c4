use std::path::Path;

use tracing::debug;

use crate::{
    controller::LifecycleController,
    error::{InterpreterError, Result},
    format::format_file_size,
    media::{is_video_mime, mime_from_extension},
    types::SelectedFile,
};

impl SelectedFile {
    /// Read a file from disk, guessing its MIME type from the extension.
    ///
    /// Unknown extensions get `application/octet-stream`, which the upload
    /// surface then refuses.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| InterpreterError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let mime_type = mime_from_extension(path).unwrap_or("application/octet-stream");

        Ok(SelectedFile::new(name, mime_type, data))
    }
}

/// What the upload surface shows for the selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size: String,
    pub mime_type: String,
}

impl From<&SelectedFile> for FileSummary {
    fn from(file: &SelectedFile) -> Self {
        Self {
            name: file.name().to_string(),
            size: format_file_size(file.size()),
            mime_type: file.mime_type().to_string(),
        }
    }
}

/// Single-file picker feeding the lifecycle controller.
#[derive(Clone)]
pub struct UploadSurface {
    controller: LifecycleController,
}

impl UploadSurface {
    pub fn new(controller: LifecycleController) -> Self {
        Self { controller }
    }

    /// Replace the selection. Non-video files are silently refused, and so is
    /// any change while a request is in flight.
    ///
    /// Returns whether the selection changed.
    pub fn select(&self, file: Option<SelectedFile>) -> bool {
        if let Some(f) = &file
            && !is_video_mime(f.mime_type())
        {
            debug!(file = f.name(), mime = f.mime_type(), "ignoring non-video file");
            return false;
        }
        self.controller.select_file(file)
    }

    /// Load a dropped or picked path. Non-video extensions are refused without
    /// reading the file.
    pub async fn select_path(&self, path: &Path) -> Result<bool> {
        if mime_from_extension(path).is_none() {
            debug!(path = %path.display(), "ignoring non-video path");
            return Ok(false);
        }
        let file = SelectedFile::from_path(path).await?;
        Ok(self.select(Some(file)))
    }

    pub fn clear(&self) {
        self.select(None);
    }

    pub fn selected(&self) -> Option<SelectedFile> {
        self.controller.state().file
    }

    pub fn summary(&self) -> Option<FileSummary> {
        self.selected().as_ref().map(FileSummary::from)
    }
}
