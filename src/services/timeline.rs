//! Scripted processing timeline
//!
//! The processing screen walks through a fixed sequence of steps while the
//! removal call runs. The sequence is decorative: it neither waits for nor
//! influences the network result.

use super::progress::{ProcessingStage, ProgressTracker};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// One scripted step of the processing screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub stage: ProcessingStage,
    pub text: String,
    pub duration_ms: u64,
}

impl TimelineStep {
    pub fn new<S: Into<String>>(stage: ProcessingStage, text: S, duration_ms: u64) -> Self {
        Self {
            stage,
            text: text.into(),
            duration_ms,
        }
    }

    /// Step using the stage's own description as its text
    #[must_use]
    pub fn for_stage(stage: ProcessingStage, duration_ms: u64) -> Self {
        Self::new(stage, stage.description(), duration_ms)
    }

    /// The four steps shown on the processing screen (4 seconds total)
    #[must_use]
    pub fn default_sequence() -> Vec<Self> {
        vec![
            Self::for_stage(ProcessingStage::Analyzing, 800),
            Self::for_stage(ProcessingStage::DetectingSubject, 1000),
            Self::for_stage(ProcessingStage::RemovingBackground, 1500),
            Self::for_stage(ProcessingStage::FinalTouches, 700),
        ]
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Runs a step sequence against a progress tracker
#[derive(Debug, Clone)]
pub struct ProcessingTimeline {
    steps: Vec<TimelineStep>,
}

impl ProcessingTimeline {
    #[must_use]
    pub fn new(steps: Vec<TimelineStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// Sum of all step durations
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(TimelineStep::duration).sum()
    }

    /// Progress percentage once `completed` steps have finished
    #[must_use]
    pub fn progress_after(&self, completed: usize) -> u8 {
        if self.steps.is_empty() {
            return 100;
        }
        let completed = completed.min(self.steps.len());
        ((completed * 100) / self.steps.len()) as u8
    }

    /// Play every step in order, reporting each one as it starts and ends
    ///
    /// Returns the final progress percentage.
    pub async fn run(&self, tracker: &mut ProgressTracker) -> u8 {
        for (index, step) in self.steps.iter().enumerate() {
            tracker.report_step(step.stage, &step.text, self.progress_after(index));
            trace!(step = %step.text, duration_ms = step.duration_ms, "timeline step");
            tokio::time::sleep(step.duration()).await;
            tracker.report_step(step.stage, &step.text, self.progress_after(index + 1));
        }
        self.progress_after(self.steps.len())
    }
}

impl Default for ProcessingTimeline {
    fn default() -> Self {
        Self::new(TimelineStep::default_sequence())
    }
}
