//! Workflow controller
//!
//! One workflow instance takes a single image from the media source through
//! background removal and into the recent-edits log:
//!
//! ```text
//! Idle → Acquiring → Submitting → Persisting → Succeeded
//!          │  │           │
//!          │  └→ Idle     └→ Failed
//!          └→ Failed
//! ```
//!
//! A cancelled pick or refused permission drops back to `Idle`. Each instance
//! submits at most once; picking another image means starting a new instance.
//! Persistence is fire-and-forget and never changes the outcome.

use crate::client::{RecentEditsStore, RemovalService};
use crate::config::{PickOptions, WorkflowConfig};
use crate::error::{PermissionKind, Result, SnapCleanError};
use crate::media::{ImageSource, MediaSource, Selection};
use crate::services::{
    ProcessingStage, ProcessingTimeline, ProgressReporter, ProgressTracker, NoOpProgressReporter,
};
use crate::tracing_config::spans;
use crate::types::{ImageRef, RecentEdit, RecentEditId, RemovalResult};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Prefix of the message shown when submission fails
pub const PROCESS_FAILURE_PREFIX: &str = "Failed to process image: ";

/// Message shown when the media source itself fails
pub const SELECT_FAILURE_MESSAGE: &str = "Failed to select image. Please try again.";

/// Where a delivered result came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOrigin {
    /// Produced by this instance's removal call
    Removal,
    /// Reopened from the recent-edits strip
    RecentEdit(RecentEditId),
}

/// The payload carried into the results view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub result: RemovalResult,
    pub origin: ResultOrigin,
}

/// Which phase a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Acquisition,
    Submission,
}

/// Terminal failure of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFailure {
    pub stage: FailureStage,
    /// User-visible message
    pub message: String,
}

/// User-facing dialog content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new<T: Into<String>, M: Into<String>>(title: T, message: M) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Client-visible state of a workflow instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Acquiring { source: ImageSource },
    Submitting { image: ImageRef },
    Persisting { result: RemovalResult },
    Succeeded(Delivery),
    Failed(WorkflowFailure),
}

/// Discriminant of [`WorkflowState`], kept in the transition history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Idle,
    Acquiring,
    Submitting,
    Persisting,
    Succeeded,
    Failed,
}

impl WorkflowState {
    #[must_use]
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Acquiring { .. } => StateKind::Acquiring,
            Self::Submitting { .. } => StateKind::Submitting,
            Self::Persisting { .. } => StateKind::Persisting,
            Self::Succeeded(_) => StateKind::Succeeded,
            Self::Failed(_) => StateKind::Failed,
        }
    }

    /// Whether the instance is finished
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

/// One pick → remove → persist → display sequence
#[derive(Debug)]
pub struct WorkflowInstance {
    id: Uuid,
    state: WorkflowState,
    history: Vec<StateKind>,
    notice: Option<Notice>,
    submitted: bool,
    persistence: Option<JoinHandle<()>>,
}

impl Default for WorkflowInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowInstance {
    /// Fresh instance in `Idle`
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: WorkflowState::Idle,
            history: vec![StateKind::Idle],
            notice: None,
            submitted: false,
            persistence: None,
        }
    }

    /// Instance that already holds an image and is ready to submit
    #[must_use]
    pub fn with_image(image: ImageRef) -> Self {
        let mut instance = Self::new();
        instance.transition(WorkflowState::Submitting { image });
        instance
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Every state the instance has passed through, in order
    #[must_use]
    pub fn history(&self) -> &[StateKind] {
        &self.history
    }

    /// Dialog the presentation layer should show, if any
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// The delivered result once `Succeeded`
    #[must_use]
    pub fn delivery(&self) -> Option<&Delivery> {
        match &self.state {
            WorkflowState::Succeeded(delivery) => Some(delivery),
            _ => None,
        }
    }

    /// The failure once `Failed`
    #[must_use]
    pub fn failure(&self) -> Option<&WorkflowFailure> {
        match &self.state {
            WorkflowState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Whether a removal call has been issued by this instance
    #[must_use]
    pub fn has_submitted(&self) -> bool {
        self.submitted
    }

    fn transition(&mut self, next: WorkflowState) {
        debug!(instance = %self.id, from = ?self.state.kind(), to = ?next.kind(), "state transition");
        self.history.push(next.kind());
        self.state = next;
    }

    fn fail(&mut self, stage: FailureStage, message: String) {
        self.notice = Some(Notice::new("Error", message.clone()));
        self.transition(WorkflowState::Failed(WorkflowFailure { stage, message }));
    }

    fn deny(&mut self, kind: PermissionKind) {
        let denial = SnapCleanError::permission_denied(kind);
        info!(instance = %self.id, reason = %denial, "Returning to idle");
        self.notice = Some(Notice::new("Permission required", kind.denial_message()));
        self.transition(WorkflowState::Idle);
    }

    /// Ask the media source for an image
    ///
    /// On a pick the instance moves to `Submitting`. A cancelled pick or a
    /// refused permission returns it to `Idle`; a media source error fails it.
    ///
    /// # Errors
    /// - The instance is not `Idle` or has already submitted
    pub async fn acquire(
        &mut self,
        media: &dyn MediaSource,
        source: ImageSource,
        options: &PickOptions,
    ) -> Result<()> {
        if self.state != WorkflowState::Idle || self.submitted {
            return Err(SnapCleanError::workflow(format!(
                "Cannot acquire an image while {:?}; start a new instance",
                self.state.kind()
            )));
        }
        self.notice = None;
        self.transition(WorkflowState::Acquiring { source });

        if !media.request_photo_library_access().await.is_granted() {
            self.deny(PermissionKind::PhotoLibrary);
            return Ok(());
        }

        let selection = match source {
            ImageSource::Library => media.pick_from_library(options).await,
            ImageSource::Camera => {
                if !media.request_camera_access().await.is_granted() {
                    self.deny(PermissionKind::Camera);
                    return Ok(());
                }
                media.capture_from_camera(options).await
            },
        };

        match selection {
            Ok(Selection::Picked(image)) => {
                info!(instance = %self.id, uri = %image.uri, "Image selected");
                self.transition(WorkflowState::Submitting { image });
            },
            Ok(Selection::Cancelled) => {
                debug!(instance = %self.id, "Image selection cancelled");
                self.transition(WorkflowState::Idle);
            },
            Err(e) => {
                warn!(instance = %self.id, error = %e, "Error picking image");
                self.fail(FailureStage::Acquisition, SELECT_FAILURE_MESSAGE.to_string());
            },
        }
        Ok(())
    }

    /// Issue this instance's single removal call
    ///
    /// # Errors
    /// - The instance is not `Submitting` or has already submitted
    pub async fn submit(
        &mut self,
        service: &dyn RemovalService,
        tracker: &mut ProgressTracker,
    ) -> Result<()> {
        let image = match (&self.state, self.submitted) {
            (WorkflowState::Submitting { image }, false) => image.clone(),
            (_, true) => {
                return Err(SnapCleanError::workflow(
                    "A removal call was already issued for this instance",
                ))
            },
            (state, false) => {
                return Err(SnapCleanError::workflow(format!(
                    "Cannot submit while {:?}",
                    state.kind()
                )))
            },
        };
        self.submitted = true;
        tracker.report_stage(ProcessingStage::Submitting);

        match service.remove_background(&image).await {
            Ok(result) => {
                info!(
                    instance = %self.id,
                    processed = %result.processed_image_uri,
                    processing_time_ms = result.processing_time_ms,
                    "Background removed"
                );
                self.transition(WorkflowState::Persisting { result });
            },
            Err(e) => {
                let message = format!("{}{}", PROCESS_FAILURE_PREFIX, e);
                tracker.report_error(&message);
                warn!(instance = %self.id, error = %e, "Processing error");
                self.fail(FailureStage::Submission, message);
            },
        }
        Ok(())
    }

    /// Fire off the recent-edit append and move to `Succeeded`
    ///
    /// The append runs on its own task; its outcome is only logged.
    ///
    /// # Errors
    /// - The instance is not `Persisting`
    pub fn persist(&mut self, store: Arc<dyn RecentEditsStore>) -> Result<()> {
        let WorkflowState::Persisting { result } = &self.state else {
            return Err(SnapCleanError::workflow(format!(
                "Cannot persist while {:?}",
                self.state.kind()
            )));
        };
        let result = result.clone();

        let record = result.clone();
        let span = spans::persistence(&self.id.to_string(), &record.processed_image_uri);
        let handle = tokio::spawn(
            async move {
                match store.record_recent_edit(&record).await {
                    Ok(id) => debug!(id = ?id, "Saved to recent edits"),
                    Err(e) => warn!(error = %e, "Failed to save to recent edits"),
                }
            }
            .instrument(span),
        );
        self.persistence = Some(handle);

        self.transition(WorkflowState::Succeeded(Delivery {
            result,
            origin: ResultOrigin::Removal,
        }));
        Ok(())
    }

    /// Enter `Succeeded` straight from a recent edit
    ///
    /// # Errors
    /// - The instance is not `Idle`
    pub fn open_recent(&mut self, edit: &RecentEdit) -> Result<()> {
        if self.state != WorkflowState::Idle || self.submitted {
            return Err(SnapCleanError::workflow(
                "Recent edits can only be opened from an idle instance",
            ));
        }
        self.deliver_recent(edit);
        Ok(())
    }

    fn deliver_recent(&mut self, edit: &RecentEdit) {
        self.transition(WorkflowState::Succeeded(Delivery {
            result: edit.to_result(),
            origin: ResultOrigin::RecentEdit(edit.id.clone()),
        }));
    }

    /// Wait for the background append, if one was started
    ///
    /// Only hosts about to tear down need this; the state machine never waits.
    pub async fn settle_persistence(&mut self) {
        if let Some(handle) = self.persistence.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Recent edit task did not finish");
            }
        }
    }
}

/// Drives workflow instances against a media source and removal service
#[derive(Clone)]
pub struct WorkflowController {
    media: Arc<dyn MediaSource>,
    service: Arc<dyn RemovalService>,
    store: Arc<dyn RecentEditsStore>,
    config: WorkflowConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl WorkflowController {
    pub fn new(
        media: Arc<dyn MediaSource>,
        service: Arc<dyn RemovalService>,
        store: Arc<dyn RecentEditsStore>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            media,
            service,
            store,
            config,
            reporter: Arc::new(NoOpProgressReporter),
        }
    }

    /// Send progress updates to `reporter`
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Run a complete instance for an image from `source`
    ///
    /// Every call starts a new instance; nothing is shared with earlier runs.
    pub async fn run(&self, source: ImageSource) -> WorkflowInstance {
        let mut instance = WorkflowInstance::new();
        let span = spans::workflow_instance(&instance.id().to_string(), &source.to_string());

        async {
            if let Err(e) = instance
                .acquire(self.media.as_ref(), source, &self.config.pick_options)
                .await
            {
                warn!(error = %e, "Acquisition rejected");
                return;
            }
            if matches!(instance.state(), WorkflowState::Submitting { .. }) {
                self.process(&mut instance).await;
            }
        }
        .instrument(span)
        .await;

        instance
    }

    /// Run an instance for an image the caller already holds
    pub async fn run_with_image(&self, image: ImageRef) -> WorkflowInstance {
        let mut instance = WorkflowInstance::with_image(image);
        let span = spans::workflow_instance(&instance.id().to_string(), "direct");
        self.process(&mut instance).instrument(span).await;
        instance
    }

    /// Submit and persist a `Submitting` instance
    ///
    /// The scripted timeline and the removal call run side by side; the
    /// instance settles only when both are done.
    pub async fn process(&self, instance: &mut WorkflowInstance) {
        let tracker = ProgressTracker::new(Arc::clone(&self.reporter));
        let timeline = ProcessingTimeline::new(self.config.timeline.clone());
        let mut timeline_tracker = tracker.clone();
        let mut submit_tracker = tracker;

        let (_, submitted) = tokio::join!(
            timeline.run(&mut timeline_tracker),
            instance.submit(self.service.as_ref(), &mut submit_tracker)
        );

        if let Err(e) = submitted {
            warn!(error = %e, "Submission rejected");
            return;
        }

        if matches!(instance.state(), WorkflowState::Persisting { .. }) {
            submit_tracker.report_stage(ProcessingStage::Persisting);
            if let Err(e) = instance.persist(Arc::clone(&self.store)) {
                warn!(error = %e, "Persistence rejected");
                return;
            }
            if let Some(delivery) = instance.delivery() {
                submit_tracker.report_stage(ProcessingStage::Completed);
                submit_tracker.report_completion(delivery.result.processing_time_ms);
            }
        }
    }

    /// Start an instance that is immediately `Succeeded` with a recent edit
    #[must_use]
    pub fn open_recent(&self, edit: &RecentEdit) -> WorkflowInstance {
        let mut instance = WorkflowInstance::new();
        instance.deliver_recent(edit);
        instance
    }
}
