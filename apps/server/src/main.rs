use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::ServerConfig, gemini::GeminiAnalyzer, routes::AppState};

mod catalog;
mod config;
mod error;
mod gemini;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let analyzer = GeminiAnalyzer::from_config(&config)?;
    info!(model = analyzer.model(), "gemini analyzer ready");

    let state = Arc::new(AppState::new(Arc::new(analyzer), config.max_upload_mb));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(addr = %listener.local_addr()?, "video-interpreter-server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
