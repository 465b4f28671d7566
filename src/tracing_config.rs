//! Logging setup for the CLI and the spans the library opens
//!
//! The library never installs a subscriber. It only enters the [`spans`] and
//! fires the [`events`] below; the binary wires them to stderr and, when asked,
//! a log file.

use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use tracing_appender::non_blocking::WorkerGuard;
#[cfg(feature = "cli")]
use tracing_subscriber::{
    fmt, layer::Layered, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

#[cfg(feature = "cli")]
type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// How log lines are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Colored single-line output
    #[default]
    Console,
    /// Plain single-line output without timestamps, for CI logs
    Compact,
    /// One JSON object per event with the enclosing spans
    #[cfg(feature = "tracing-json")]
    Json,
}

/// Subscriber settings for one CLI run
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Number of `-v` flags
    pub verbosity: u8,
    pub format: TracingFormat,
    /// Also append every event to this file
    pub log_file: Option<PathBuf>,
    /// Filter directives that replace the verbosity mapping (`RUST_LOG`)
    pub env_filter: Option<String>,
    pub session_id: Option<String>,
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_log_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with_session_id<S: Into<String>>(mut self, session_id: S) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Level filter for the verbosity count
    pub fn verbosity_to_filter(&self) -> &'static str {
        match self.verbosity {
            0 => "info",  // state transitions and results
            1 => "debug", // -v: requests, permissions, persistence
            _ => "trace", // -vv: timeline steps
        }
    }

    /// Build the subscriber without installing it
    ///
    /// # Errors
    /// - Invalid filter directives
    /// - The log file location cannot be created
    #[cfg(feature = "cli")]
    pub fn build(
        &self,
    ) -> anyhow::Result<(impl tracing::Subscriber + Send + Sync + 'static, TracingGuard)> {
        let directives = self
            .env_filter
            .as_deref()
            .unwrap_or_else(|| self.verbosity_to_filter());
        let filter = EnvFilter::try_new(directives)?;

        let mut layers: Vec<BoxedLayer> = vec![self.console_layer()];
        let mut file_guard = None;
        if let Some(path) = &self.log_file {
            let (layer, guard) = self.file_layer(path)?;
            layers.push(layer);
            file_guard = Some(guard);
        }

        let subscriber = Registry::default().with(filter).with(layers);
        let guard = TracingGuard {
            session_id: self.session_id.clone(),
            _file: file_guard,
        };
        Ok((subscriber, guard))
    }

    /// Install the subscriber as the global default
    ///
    /// Keep the returned guard alive for as long as events should reach the
    /// log file.
    ///
    /// # Errors
    /// - See [`TracingConfig::build`]
    /// - A global subscriber is already installed
    #[cfg(feature = "cli")]
    pub fn init(self) -> anyhow::Result<TracingGuard> {
        let (subscriber, guard) = self.build()?;
        subscriber.try_init()?;

        if let Some(session_id) = guard.session_id() {
            tracing::info!(
                session_id = %session_id,
                log_file = ?self.log_file,
                "SnapClean session started"
            );
        }
        Ok(guard)
    }

    #[cfg(feature = "cli")]
    fn console_layer(&self) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        match self.format {
            TracingFormat::Console => layer.with_ansi(true).compact().boxed(),
            TracingFormat::Compact => layer.with_ansi(false).without_time().compact().boxed(),
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => layer
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
        }
    }

    #[cfg(feature = "cli")]
    fn file_layer(&self, path: &Path) -> anyhow::Result<(BoxedLayer, WorkerGuard)> {
        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;
        let dir = log_dir(path);
        std::fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("Cannot create log directory {}: {}", dir.display(), e))?;

        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        let layer = match self.format {
            #[cfg(feature = "tracing-json")]
            TracingFormat::Json => layer
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .boxed(),
            _ => layer.compact().boxed(),
        };
        Ok((layer, guard))
    }
}

/// Directory holding `path`, with bare file names resolved against `.`
#[cfg_attr(not(feature = "cli"), allow(dead_code))]
fn log_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Keeps the log file writer flushing until dropped
#[cfg(feature = "cli")]
#[must_use = "dropping the guard stops writing to the log file"]
pub struct TracingGuard {
    session_id: Option<String>,
    _file: Option<WorkerGuard>,
}

#[cfg(feature = "cli")]
impl TracingGuard {
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

/// Install CLI logging with a fresh session id
///
/// `RUST_LOG` overrides the verbosity flags when set.
///
/// # Errors
/// - See [`TracingConfig::init`]
#[cfg(feature = "cli")]
pub fn init_cli_tracing(
    verbosity: u8,
    json: bool,
    log_file: Option<&Path>,
) -> anyhow::Result<TracingGuard> {
    let format = if json {
        #[cfg(feature = "tracing-json")]
        {
            TracingFormat::Json
        }
        #[cfg(not(feature = "tracing-json"))]
        {
            eprintln!("JSON logging needs the tracing-json feature; using console output");
            TracingFormat::Console
        }
    } else {
        TracingFormat::Console
    };

    let mut config = TracingConfig::new()
        .with_verbosity(verbosity)
        .with_format(format)
        .with_session_id(uuid::Uuid::new_v4().to_string());
    if let Some(path) = log_file {
        config = config.with_log_file(path);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        config = config.with_env_filter(filter);
    }
    config.init()
}

/// Span creation helpers for workflow operations
pub mod spans {
    use tracing::{Level, Span};

    /// Span for the whole CLI run
    pub fn session(session_id: &str, server: &str) -> Span {
        tracing::span!(
            Level::INFO,
            "session",
            session_id = %session_id,
            server = %server
        )
    }

    /// Span covering one workflow instance from pick to delivery
    pub fn workflow_instance(instance_id: &str, source: &str) -> Span {
        tracing::span!(
            Level::INFO,
            "workflow",
            instance_id = %instance_id,
            source = %source
        )
    }

    /// Span for the background recent-edit append
    pub fn persistence(instance_id: &str, processed_uri: &str) -> Span {
        tracing::span!(
            Level::DEBUG,
            "persistence",
            instance_id = %instance_id,
            processed_uri = %processed_uri
        )
    }

    /// Span for loading the recent-edits strip
    pub fn recent_edits_fetch() -> Span {
        tracing::span!(Level::DEBUG, "recent_edits_fetch")
    }

    /// Span for saving a processed image
    pub fn export(uri: &str, destination: &std::path::Path) -> Span {
        tracing::span!(
            Level::INFO,
            "export",
            uri = %uri,
            destination = %destination.display()
        )
    }
}

/// Event helpers for common logging patterns
pub mod events {
    use tracing::{debug, error, warn};

    /// Log an error with context
    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!(
            error = %error,
            context = %context,
            "Operation failed"
        );
    }

    /// Log a notice that the user has to act on
    pub fn user_notice(title: &str, message: &str) {
        warn!(title = %title, message = %message, "User notice");
    }

    /// Log timing of a finished operation
    pub fn performance_metric(operation: &str, duration_ms: u64) {
        debug!(
            operation = %operation,
            duration_ms = %duration_ms,
            "Performance metric"
        );
    }
}
