//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{ClientConfig, PickOptions, WorkflowConfig};
use crate::media::FileMediaSource;
use crate::types::RecentEditId;
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments into library configuration
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Client settings: environment first, flags on top
    pub(crate) fn client_config(cli: &Cli) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env().context("Invalid environment configuration")?;
        if let Some(server) = &cli.server {
            config.base_url.clone_from(server);
        }
        if let Some(secs) = cli.timeout {
            config.request_timeout_secs = Some(secs);
        }
        config.validate().context("Invalid client configuration")?;
        Ok(config)
    }

    /// Picker options and timeline from the flags
    pub(crate) fn workflow_config(cli: &Cli) -> Result<WorkflowConfig> {
        let pick_options = PickOptions {
            allow_editing: !cli.no_crop,
            quality: cli.quality,
            ..PickOptions::default()
        };

        let mut builder = WorkflowConfig::builder().pick_options(pick_options);
        if cli.no_animation {
            builder = builder.without_timeline();
        }
        builder.build().context("Invalid picker options")
    }

    /// Filesystem media source for the selected input or capture directory
    pub(crate) fn media_source(cli: &Cli) -> FileMediaSource {
        let mut media = FileMediaSource::new(FileMediaSource::default_work_dir());
        if let Some(input) = &cli.input {
            media = media.with_library_selection(input);
        }
        if let Some(dir) = &cli.camera_dir {
            media = media.with_capture_dir(dir);
        }
        media
    }

    /// Recent-edit ids are numeric when they look numeric
    pub(crate) fn parse_recent_id(raw: &str) -> RecentEditId {
        raw.trim()
            .parse::<i64>()
            .map_or_else(|_| RecentEditId::Text(raw.trim().to_string()), RecentEditId::Number)
    }

    /// Validate CLI arguments for consistency
    pub(crate) fn validate_cli(cli: &Cli) -> Result<()> {
        if !(cli.quality > 0.0 && cli.quality <= 1.0) {
            anyhow::bail!("Quality must be in (0, 1], got {}", cli.quality);
        }
        if cli.timeout == Some(0) {
            anyhow::bail!("Timeout must be at least one second");
        }
        Ok(())
    }

    /// Request timeout as a duration, for display
    pub(crate) fn timeout(cli: &Cli) -> Option<Duration> {
        cli.timeout.map(Duration::from_secs)
    }
}
