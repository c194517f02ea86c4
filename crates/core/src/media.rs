use std::path::Path;

/// Video MIME types accepted by the upload surface.
pub const VIDEO_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/x-msvideo",
    "video/quicktime",
    "video/x-ms-wmv",
    "video/x-flv",
    "video/webm",
    "video/x-matroska",
    "video/mpeg",
    "video/3gpp",
    "video/ogg",
];

/// MIME type the backend assumes when the extension is unknown.
pub const FALLBACK_VIDEO_MIME: &str = "video/mp4";

pub fn is_video_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    VIDEO_MIME_TYPES.contains(&essence.as_str())
}

/// Guess a video MIME type from a file name's extension
pub fn mime_from_extension(file_name: impl AsRef<Path>) -> Option<&'static str> {
    let ext = file_name
        .as_ref()
        .extension()?
        .to_string_lossy()
        .to_lowercase();

    let mime = match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "ogv" => "video/ogg",
        _ => return None,
    };
    Some(mime)
}
