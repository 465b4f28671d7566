//! SnapClean CLI Tool
//!
//! Command-line frontend for the background-removal workflow: pick a photo or
//! the latest capture, watch the processing timeline, then print or save the
//! result.

use super::config::CliConfigBuilder;
use super::progress::create_cli_progress_reporter;
use crate::{
    client::HttpRemovalClient,
    config::ClientConfig,
    media::ImageSource,
    presentation::{HomeView, ResultsView},
    services::ResultExporter,
    tracing_config::{events, init_cli_tracing, spans},
    workflow::{WorkflowController, WorkflowInstance, WorkflowState},
};
use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, Instrument};

/// Remove photo backgrounds through a SnapClean server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "snapclean")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Image to pick from the "photo library"
    #[arg(
        value_name = "INPUT",
        required_unless_present_any = ["camera", "list_recent", "open_recent"],
        conflicts_with_all = ["camera", "list_recent", "open_recent"]
    )]
    pub input: Option<PathBuf>,

    /// Capture from the camera instead (newest image in --camera-dir)
    #[arg(long, conflicts_with_all = ["list_recent", "open_recent"])]
    pub camera: bool,

    /// Directory the camera drops captures into
    #[arg(long, value_name = "DIR")]
    pub camera_dir: Option<PathBuf>,

    /// Base URL of the SnapClean server [env: SNAPCLEAN_SERVER_URL]
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Save the processed image (file or directory; defaults to the downloads folder)
    #[arg(short, long, value_name = "PATH", num_args = 0..=1)]
    pub output: Option<Option<PathBuf>>,

    /// Submit the image as-is instead of cropping it square
    #[arg(long)]
    pub no_crop: bool,

    /// JPEG quality of cropped images, in (0, 1]
    #[arg(long, default_value_t = 0.8)]
    pub quality: f32,

    /// Skip the processing timeline and finish as soon as the server answers
    #[arg(long)]
    pub no_animation: bool,

    /// Print the recent edits and exit
    #[arg(long, conflicts_with = "open_recent")]
    pub list_recent: bool,

    /// Open a recent edit by id instead of processing a new image
    #[arg(long, value_name = "ID")]
    pub open_recent: Option<String>,

    /// Request timeout in seconds [env: SNAPCLEAN_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Suppress the progress display
    #[arg(short, long)]
    pub quiet: bool,

    /// Emit logs as JSON (requires the tracing-json feature)
    #[arg(long)]
    pub log_json: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let logging = init_cli_tracing(cli.verbose, cli.log_json, cli.log_file.as_deref())
        .context("Failed to initialize tracing")?;

    CliConfigBuilder::validate_cli(&cli).context("Invalid CLI arguments")?;
    let client_config = CliConfigBuilder::client_config(&cli)?;

    let span = spans::session(logging.session_id().unwrap_or_default(), &client_config.base_url);
    run(&cli, client_config).instrument(span).await
}

async fn run(cli: &Cli, client_config: ClientConfig) -> Result<ExitCode> {
    info!("Using server {}", client_config.base_url);
    if let Some(timeout) = CliConfigBuilder::timeout(cli) {
        debug!(timeout_secs = timeout.as_secs(), "Request timeout set");
    }
    let client =
        Arc::new(HttpRemovalClient::new(client_config).context("Failed to create removal client")?);

    if cli.list_recent {
        return list_recent_edits(client.as_ref()).await;
    }

    let controller = WorkflowController::new(
        Arc::new(CliConfigBuilder::media_source(cli)),
        client.clone(),
        client.clone(),
        CliConfigBuilder::workflow_config(cli)?,
    )
    .with_reporter(create_cli_progress_reporter(cli.verbose, cli.quiet));

    let mut instance = if let Some(raw_id) = &cli.open_recent {
        let wanted = CliConfigBuilder::parse_recent_id(raw_id);
        let mut home = HomeView::new();
        home.refresh(client.as_ref()).await;
        let Some(edit) = home.recent_edits.iter().find(|edit| edit.id == wanted) else {
            error!("Recent edit {} not found", raw_id);
            return Ok(ExitCode::FAILURE);
        };
        controller.open_recent(edit)
    } else {
        let source = if cli.camera {
            ImageSource::Camera
        } else {
            ImageSource::Library
        };
        controller.run(source).await
    };

    // The process is about to exit; let the recent-edit append land first.
    instance.settle_persistence().await;

    report_outcome(cli, &instance).await
}

async fn report_outcome(cli: &Cli, instance: &WorkflowInstance) -> Result<ExitCode> {
    match instance.state() {
        WorkflowState::Succeeded(delivery) => {
            let view = ResultsView::new(delivery);
            let result = view.result();
            println!("✅ {}", view.displayed_uri());
            println!("   original:   {}", result.original_image_uri);
            println!(
                "   size:       {}x{}",
                result.image_width, result.image_height
            );
            println!("   processing: {}ms", result.processing_time_ms);
            events::performance_metric("remove_background", result.processing_time_ms);

            if let Some(target) = &cli.output {
                let exporter = ResultExporter::new().context("Failed to prepare export")?;
                match exporter.save(result, target.as_deref()).await {
                    Ok(saved) => println!("💾 Saved to {}", saved.display()),
                    Err(e) => {
                        events::error_with_context(&e, "save processed image");
                        eprintln!("❌ Failed to save image: {}", e);
                        return Ok(ExitCode::FAILURE);
                    },
                }
            }
            Ok(ExitCode::SUCCESS)
        },
        WorkflowState::Failed(failure) => {
            if let Some(notice) = instance.notice() {
                events::user_notice(&notice.title, &notice.message);
            }
            eprintln!("❌ {}", failure.message);
            Ok(ExitCode::FAILURE)
        },
        WorkflowState::Idle => match instance.notice() {
            Some(notice) => {
                events::user_notice(&notice.title, &notice.message);
                eprintln!("🔒 {}: {}", notice.title, notice.message);
                Ok(ExitCode::FAILURE)
            },
            None => {
                info!("No image selected");
                Ok(ExitCode::SUCCESS)
            },
        },
        other => {
            warn!("Workflow stopped in unexpected state {:?}", other.kind());
            Ok(ExitCode::FAILURE)
        },
    }
}

async fn list_recent_edits(client: &HttpRemovalClient) -> Result<ExitCode> {
    let mut home = HomeView::new();
    home.refresh(client).await;

    if home.is_empty() {
        println!("No recent edits");
        return Ok(ExitCode::SUCCESS);
    }

    println!("🕘 Recent edits:");
    for edit in &home.recent_edits {
        println!(
            "  • {:<8} {}x{:<6} {:>6}ms  {}",
            edit.id.to_string(),
            edit.image_width,
            edit.image_height,
            edit.processing_time,
            edit.processed_image_uri
        );
    }
    println!("💡 To open one: snapclean --open-recent ID");
    Ok(ExitCode::SUCCESS)
}
