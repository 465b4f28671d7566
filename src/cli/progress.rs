//! Terminal progress display for the processing screen

use crate::services::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProcessingTimings,
    ProgressReporter, ProgressUpdate,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Arc;

/// Progress bar mirroring the scripted processing timeline
#[derive(Debug)]
pub struct IndicatifProgressReporter {
    bar: ProgressBar,
}

impl IndicatifProgressReporter {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Self { bar }
    }
}

impl Default for IndicatifProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        // The removal call reports its own stages; only timeline steps move the bar.
        match update.stage {
            ProcessingStage::Analyzing
            | ProcessingStage::DetectingSubject
            | ProcessingStage::RemovingBackground
            | ProcessingStage::FinalTouches => {
                self.bar.set_position(u64::from(update.progress));
                self.bar.set_message(update.description);
            },
            _ => {},
        }
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        self.bar.set_position(100);
        self.bar.finish_with_message(format!(
            "Background removed ({}ms, service {}ms)",
            timings.total_ms, timings.server_ms
        ));
    }

    fn report_error(&self, _stage: ProcessingStage, error: &str) {
        self.bar.abandon_with_message(error.to_string());
    }
}

/// Pick a reporter for the current terminal
///
/// A bar only makes sense on an interactive stderr without debug logging
/// interleaved; otherwise progress goes through the log.
#[must_use]
pub fn create_cli_progress_reporter(verbosity: u8, quiet: bool) -> Arc<dyn ProgressReporter> {
    if quiet {
        Arc::new(NoOpProgressReporter)
    } else if verbosity == 0 && std::io::stderr().is_terminal() {
        Arc::new(IndicatifProgressReporter::new())
    } else {
        Arc::new(ConsoleProgressReporter::new(verbosity > 0))
    }
}
