use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use video_interpreter_core::{
    AnalysisResult, ClientConfig, HttpTransport, LifecycleController, LifecycleState,
    OptionsCatalog, Transport, UploadEncoding, UploadSurface,
    config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT},
    format_duration,
};

use crate::output::{print_catalog, print_failure, print_result};
use crate::progress::{create_progress_bar, create_spinner, follow_progress};

mod output;
mod progress;

/// CLI wrapper for UploadEncoding (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliEncoding {
    #[default]
    Multipart,
    Base64,
}

impl From<CliEncoding> for UploadEncoding {
    fn from(cli: CliEncoding) -> Self {
        match cli {
            CliEncoding::Multipart => UploadEncoding::Multipart,
            CliEncoding::Base64 => UploadEncoding::Base64,
        }
    }
}

#[derive(Parser)]
#[command(name = "vinterp")]
#[command(about = "Analyze videos with Gemini through a video-interpreter backend")]
struct Cli {
    /// Backend base address
    #[arg(long, global = true, env = "VIDEO_INTERPRETER_URL", default_value = DEFAULT_BASE_URL)]
    backend: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the analysis types the backend supports
    Options,

    /// Upload a local video and print the analysis
    Analyze {
        /// Video file to upload
        file: PathBuf,

        /// Analysis type key (see `vinterp options`)
        #[arg(short = 't', long = "type")]
        analysis_type: Option<String>,

        /// Prompt for the `custom` analysis type
        #[arg(short, long)]
        prompt: Option<String>,

        /// How the video is sent to the backend
        #[arg(short, long, value_enum, default_value_t)]
        encoding: CliEncoding,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Analyze a video that already sits on the backend's disk
    Remote {
        /// Path on the backend host
        video_path: String,

        /// Analysis type key
        #[arg(short = 't', long = "type")]
        analysis_type: String,

        /// Prompt for the `custom` analysis type
        #[arg(short, long)]
        prompt: Option<String>,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Check that the backend is up
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.backend).with_timeout(Duration::from_secs(cli.timeout));
    debug!(backend = %config.base_url, timeout = ?config.timeout, "client configured");

    match cli.command {
        Command::Options => list_options(config).await,
        Command::Analyze {
            file,
            analysis_type,
            prompt,
            encoding,
            json,
        } => {
            let config = config.with_encoding(encoding.into());
            analyze(config, file, analysis_type, prompt, json).await
        }
        Command::Remote {
            video_path,
            analysis_type,
            prompt,
            json,
        } => remote(config, video_path, analysis_type, prompt, json).await,
        Command::Health => health(config).await,
    }
}

async fn list_options(config: ClientConfig) -> Result<ExitCode> {
    let transport = HttpTransport::new(config)?;
    let catalog = OptionsCatalog::load(&transport).await;
    print_catalog(&catalog);

    Ok(if catalog.notice().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn analyze(
    config: ClientConfig,
    file: PathBuf,
    analysis_type: Option<String>,
    prompt: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let transport = Arc::new(HttpTransport::new(config)?);

    println!(
        "\n{}  {}\n",
        style("video-interpreter").cyan().bold(),
        style(transport.config().base_url.as_str()).dim()
    );

    let catalog = OptionsCatalog::load(transport.as_ref()).await;
    if let Some(notice) = catalog.notice() {
        println!("{} {}", style("!").yellow().bold(), style(notice).yellow());
    } else if let Some(key) = analysis_type.as_deref()
        && !catalog.contains(key)
    {
        println!(
            "{} Unknown analysis type {} (see `vinterp options`)",
            style("!").yellow().bold(),
            style(key).yellow()
        );
    }

    let controller = LifecycleController::new(transport);
    let surface = UploadSurface::new(controller.clone());

    if !surface.select_path(&file).await? {
        eprintln!(
            "{} {} is not a supported video file",
            style("Error:").red().bold(),
            file.display()
        );
        return Ok(ExitCode::FAILURE);
    }
    if let Some(summary) = surface.summary() {
        println!(
            "{} Selected: {} {}",
            style("✓").green().bold(),
            summary.name,
            style(format!("({}, {})", summary.size, summary.mime_type)).dim()
        );
    }

    controller.set_analysis_type(analysis_type);
    if let Some(prompt) = prompt {
        controller.set_custom_prompt(prompt);
    }

    let started = std::time::Instant::now();
    let pb = create_progress_bar("Analyzing video...");
    let follower = follow_progress(pb.clone(), controller.subscribe());

    let outcome = controller.analyze().await;
    follower.abort();

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            pb.finish_and_clear();
            eprintln!("{} {}", style("Error:").red().bold(), err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let state = controller.state();
    let elapsed = style(format!("[{}]", format_duration(started.elapsed()))).dim();
    if state.phase == LifecycleState::Succeeded {
        pb.set_position(100);
        pb.finish_with_message(format!(
            "{} Analysis complete {}",
            style("✓").green().bold(),
            elapsed
        ));
    } else {
        pb.abandon_with_message(format!(
            "{} Analysis failed {}",
            style("✗").red().bold(),
            elapsed
        ));
    }

    report(&result, state.error.as_deref(), json)
}

async fn remote(
    config: ClientConfig,
    video_path: String,
    analysis_type: String,
    prompt: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let transport = HttpTransport::new(config)?;

    let spinner = create_spinner(&format!("Analyzing {} on the backend...", video_path));
    let outcome = transport
        .analyze_path(&video_path, &analysis_type, prompt.as_deref())
        .await;
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            let error = result.error.clone();
            report(&result, error.as_deref(), json)
        }
        Err(err) => {
            eprintln!("{} {}", style("Error:").red().bold(), err);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn report(result: &AnalysisResult, error: Option<&str>, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.success {
        print_result(result);
    } else {
        print_failure(result, error);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn health(config: ClientConfig) -> Result<ExitCode> {
    let transport = HttpTransport::new(config)?;
    match transport.health().await {
        Ok(status) => {
            println!(
                "{} {} {}",
                style("✓").green().bold(),
                status.status,
                style(status.message).dim()
            );
            if let Ok(info) = transport.api_info().await {
                println!("  {} {}", info.message, style(format!("v{}", info.version)).dim());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{} {}", style("Error:").red().bold(), err);
            Ok(ExitCode::FAILURE)
        }
    }
}
