#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # SnapClean
//!
//! Client for a remote background-removal service. A workflow instance takes
//! one image from the photo library or the camera, submits it for removal,
//! records the result in the service's recent-edits log and hands the result
//! to the presentation layer.
//!
//! ## Features
//!
//! - **Workflow state machine**: `Idle → Acquiring → Submitting → Persisting → Succeeded | Failed`
//! - **Async HTTP client**: one POST per image, no retry, optional timeout
//! - **Media sources**: a trait seam plus a filesystem adapter with cropping
//! - **Processing timeline**: scripted progress that runs beside the network call
//! - **CLI Integration**: Optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snapclean::{
//!     ClientConfig, FileMediaSource, HttpRemovalClient, ImageSource, WorkflowConfig,
//!     WorkflowController,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = Arc::new(HttpRemovalClient::new(ClientConfig::from_env()?)?);
//! let media = FileMediaSource::new(FileMediaSource::default_work_dir())
//!     .with_library_selection("photo.jpg");
//!
//! let controller = WorkflowController::new(
//!     Arc::new(media),
//!     client.clone(),
//!     client,
//!     WorkflowConfig::default(),
//! );
//!
//! let instance = controller.run(ImageSource::Library).await;
//! if let Some(delivery) = instance.delivery() {
//!     println!("{}", delivery.result.processed_image_uri);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface and progress bars
//! - `testing`: Mock media source, removal service and recent-edits store
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! snapclean = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod media;
pub mod presentation;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tracing_config;
pub mod types;
pub mod workflow;

pub use client::{HttpRemovalClient, RecentEditsStore, RemovalService};
pub use config::{ClientConfig, ClientConfigBuilder, PickOptions, WorkflowConfig};
pub use error::{PermissionKind, Result, SnapCleanError};
pub use media::{FileMediaSource, ImageSource, MediaSource, Permission, Selection};
pub use presentation::{Enhancements, HomeView, ResultsView};
pub use services::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProcessingTimeline,
    ProgressReporter, ProgressUpdate, ResultExporter, TimelineStep,
};
pub use types::{ImageRef, RecentEdit, RecentEditId, RemovalResult};
pub use workflow::{
    Delivery, FailureStage, Notice, ResultOrigin, StateKind, WorkflowController,
    WorkflowFailure, WorkflowInstance, WorkflowState,
};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat, TracingGuard};
