use std::net::SocketAddr;

use clap::Parser;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, Parser)]
#[command(name = "video-interpreter-server")]
#[command(about = "Analyze uploaded videos with Google's Gemini")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "VIDEO_INTERPRETER_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Gemini model used for every analysis
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Largest accepted video, in megabytes
    #[arg(long, env = "VIDEO_INTERPRETER_MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,

    /// Gemini REST endpoint root
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,
}
