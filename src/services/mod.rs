//! Services that sit beside the workflow
//!
//! Progress reporting, the scripted processing timeline and the "save" action
//! are kept apart from the state machine so frontends can swap them freely.

pub mod export;
pub mod progress;
pub mod timeline;

pub use export::{timestamped_file_name, ResultExporter};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProcessingTimings,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use timeline::{ProcessingTimeline, TimelineStep};
