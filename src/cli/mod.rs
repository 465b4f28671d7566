//! CLI module for the snapclean binary
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod progress;

pub use main_impl::{main, Cli};
pub use progress::{create_cli_progress_reporter, IndicatifProgressReporter};
