//! Progress reporting service
//!
//! This module separates progress reporting from the workflow itself,
//! allowing different frontends to implement their own progress handling.

use instant::Instant;
use std::sync::Arc;

/// Stages a workflow instance reports while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProcessingStage {
    /// Waiting on the media source
    Acquiring,
    /// Scripted step: looking at the image
    Analyzing,
    /// Scripted step: finding the foreground
    DetectingSubject,
    /// Scripted step: cutting the background out
    RemovingBackground,
    /// Scripted step: polishing the result
    FinalTouches,
    /// Waiting on the removal service
    Submitting,
    /// Recording the recent edit
    Persisting,
    /// Result ready for presentation
    Completed,
}

impl ProcessingStage {
    /// Get a human-readable description of the stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Acquiring => "Selecting image...",
            ProcessingStage::Analyzing => "Analyzing image...",
            ProcessingStage::DetectingSubject => "Detecting subject...",
            ProcessingStage::RemovingBackground => "Removing background...",
            ProcessingStage::FinalTouches => "Applying final touches...",
            ProcessingStage::Submitting => "Waiting for the removal service...",
            ProcessingStage::Persisting => "Saving to recent edits...",
            ProcessingStage::Completed => "Done",
        }
    }

    /// Get the nominal progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::Acquiring => 0,
            ProcessingStage::Analyzing => 25,
            ProcessingStage::DetectingSubject => 50,
            ProcessingStage::RemovingBackground => 75,
            ProcessingStage::FinalTouches | ProcessingStage::Completed => 100,
            ProcessingStage::Submitting => 90,
            ProcessingStage::Persisting => 95,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current processing stage
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable stage description
    pub description: String,
    /// Elapsed time since processing started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    /// Create a new progress update
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }

    /// Create a progress update with custom description and percentage
    #[must_use]
    pub fn with_description(
        stage: ProcessingStage,
        description: String,
        progress: u8,
        start_time: Instant,
    ) -> Self {
        Self {
            progress: progress.min(100),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Wall-clock and server timings for one completed instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingTimings {
    /// Time from submission to delivery, timeline included
    pub total_ms: u64,
    /// Processing time reported by the removal service
    pub server_ms: u64,
}

/// Trait for reporting progress during a workflow instance
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    fn report_progress(&self, update: ProgressUpdate);

    /// Report completion with final timings
    fn report_completion(&self, timings: ProcessingTimings);

    /// Report an error during processing
    ///
    /// # Arguments
    /// * `stage` - Stage where error occurred
    /// * `error` - Error description
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: ProcessingTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Console progress reporter that logs progress through `log`
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to show elapsed times
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            log::info!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        log::info!("✅ Background removed in {}ms", timings.total_ms);

        if self.verbose {
            log::info!("    • Service processing: {}ms", timings.server_ms);
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("❌ Error during {}: {}", stage.description(), error);
    }
}

/// Progress tracker that manages timing and the current stage
#[derive(Clone)]
pub struct ProgressTracker {
    reporter: Arc<dyn ProgressReporter>,
    start_time: Instant,
    current_stage: Option<ProcessingStage>,
}

impl ProgressTracker {
    /// Create a new progress tracker with the specified reporter
    #[must_use]
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            start_time: Instant::now(),
            current_stage: None,
        }
    }

    /// Create a progress tracker with no-op reporter
    #[must_use]
    pub fn no_op() -> Self {
        Self::new(Arc::new(NoOpProgressReporter))
    }

    /// Report progress for a specific stage
    pub fn report_stage(&mut self, stage: ProcessingStage) {
        self.current_stage = Some(stage);
        self.reporter
            .report_progress(ProgressUpdate::new(stage, self.start_time));
    }

    /// Report progress with custom description and percentage
    pub fn report_step(&mut self, stage: ProcessingStage, description: &str, progress: u8) {
        self.current_stage = Some(stage);
        self.reporter.report_progress(ProgressUpdate::with_description(
            stage,
            description.to_string(),
            progress,
            self.start_time,
        ));
    }

    /// Report completion with final timings
    pub fn report_completion(&self, server_ms: u64) {
        self.reporter.report_completion(ProcessingTimings {
            total_ms: self.elapsed_ms(),
            server_ms,
        });
    }

    /// Report an error during processing
    pub fn report_error(&self, error: &str) {
        let stage = self.current_stage.unwrap_or(ProcessingStage::Acquiring);
        self.reporter.report_error(stage, error);
    }

    /// Get the elapsed time since tracking started
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Get the current processing stage
    #[must_use]
    pub fn current_stage(&self) -> Option<ProcessingStage> {
        self.current_stage
    }
}
