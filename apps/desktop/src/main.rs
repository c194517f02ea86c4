use std::{sync::Arc, time::Duration};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use video_interpreter_core::{
    ClientConfig, HttpTransport,
    config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
};

use crate::app::App;

mod app;

#[derive(Parser)]
#[command(name = "video-interpreter-desktop")]
#[command(about = "Desktop front end for a video-interpreter backend")]
struct Cli {
    /// Backend base address
    #[arg(long, env = "VIDEO_INTERPRETER_URL", default_value = DEFAULT_BASE_URL)]
    backend: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.backend).with_timeout(Duration::from_secs(cli.timeout));
    let transport = Arc::new(HttpTransport::new(config)?);

    iced::application(move || App::new(transport.clone()), App::update, App::view)
        .title("Video Interpreter")
        .subscription(App::subscription)
        .run()?;

    Ok(())
}
