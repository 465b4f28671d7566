//! Mock collaborators for exercising the workflow without a device or server
//!
//! Every mock records the calls it receives so tests can assert on ordering
//! and on how many times a seam was hit.

use crate::client::{RecentEditsStore, RemovalService};
use crate::config::PickOptions;
use crate::error::{Result, SnapCleanError};
use crate::media::{MediaSource, Permission, Selection};
use crate::types::wire::RecentEditRequest;
use crate::types::{ImageRef, RecentEdit, RecentEditId, RemovalResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn snapshot<T: Clone>(shared: &Arc<Mutex<Vec<T>>>) -> Vec<T> {
    shared.lock().map(|items| items.clone()).unwrap_or_default()
}

fn push<T>(shared: &Arc<Mutex<Vec<T>>>, item: T) {
    if let Ok(mut items) = shared.lock() {
        items.push(item);
    }
}

#[derive(Debug, Clone)]
enum MockPick {
    Picked(ImageRef),
    Cancelled,
    Fails(String),
}

/// Media source with scripted permissions and a scripted pick
#[derive(Debug, Clone)]
pub struct MockMediaSource {
    pick: MockPick,
    library_permission: Permission,
    camera_permission: Permission,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockMediaSource {
    fn with_pick(pick: MockPick) -> Self {
        Self {
            pick,
            library_permission: Permission::Granted,
            camera_permission: Permission::Granted,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Both pickers hand back `image`
    #[must_use]
    pub fn picking(image: ImageRef) -> Self {
        Self::with_pick(MockPick::Picked(image))
    }

    /// The user dismisses every picker
    #[must_use]
    pub fn cancelling() -> Self {
        Self::with_pick(MockPick::Cancelled)
    }

    /// Every pick fails with `message`
    #[must_use]
    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self::with_pick(MockPick::Fails(message.into()))
    }

    #[must_use]
    pub fn deny_library(mut self) -> Self {
        self.library_permission = Permission::Denied;
        self
    }

    #[must_use]
    pub fn deny_camera(mut self) -> Self {
        self.camera_permission = Permission::Denied;
        self
    }

    /// Get the call history for verification in tests
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        snapshot(&self.call_history)
    }

    fn record_call(&self, method: &str) {
        push(&self.call_history, method.to_string());
    }

    fn selection(&self) -> Result<Selection> {
        match &self.pick {
            MockPick::Picked(image) => Ok(Selection::Picked(image.clone())),
            MockPick::Cancelled => Ok(Selection::Cancelled),
            MockPick::Fails(message) => Err(SnapCleanError::acquisition(message.clone())),
        }
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn request_photo_library_access(&self) -> Permission {
        self.record_call("request_photo_library_access");
        self.library_permission
    }

    async fn request_camera_access(&self) -> Permission {
        self.record_call("request_camera_access");
        self.camera_permission
    }

    async fn pick_from_library(&self, _options: &PickOptions) -> Result<Selection> {
        self.record_call("pick_from_library");
        self.selection()
    }

    async fn capture_from_camera(&self, _options: &PickOptions) -> Result<Selection> {
        self.record_call("capture_from_camera");
        self.selection()
    }
}

/// Removal service answering every submission the same way
#[derive(Debug, Clone)]
pub struct MockRemovalService {
    outcome: std::result::Result<RemovalResult, String>,
    latency: Option<Duration>,
    submissions: Arc<Mutex<Vec<ImageRef>>>,
}

impl MockRemovalService {
    #[must_use]
    pub fn succeeding(result: RemovalResult) -> Self {
        Self {
            outcome: Ok(result),
            latency: None,
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every submission fails with the message of `error`
    #[must_use]
    pub fn failing(error: SnapCleanError) -> Self {
        Self {
            outcome: Err(error.to_string()),
            latency: None,
            submissions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer only after `latency` has passed
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Images submitted so far, in order
    #[must_use]
    pub fn submissions(&self) -> Vec<ImageRef> {
        snapshot(&self.submissions)
    }
}

#[async_trait]
impl RemovalService for MockRemovalService {
    async fn remove_background(&self, image: &ImageRef) -> Result<RemovalResult> {
        push(&self.submissions, image.clone());
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.outcome {
            Ok(result) => Ok(result.clone()),
            Err(message) => Err(SnapCleanError::removal_failed(message.clone())),
        }
    }
}

/// In-memory recent-edits log
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    edits: Vec<RecentEdit>,
    fail_appends: bool,
    fail_lists: bool,
    append_latency: Option<Duration>,
    appended: Arc<Mutex<Vec<RecentEditRequest>>>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose listing returns `edits`
    #[must_use]
    pub fn with_edits(edits: Vec<RecentEdit>) -> Self {
        Self {
            edits,
            ..Self::default()
        }
    }

    /// Store rejecting every append
    #[must_use]
    pub fn failing_appends() -> Self {
        Self {
            fail_appends: true,
            ..Self::default()
        }
    }

    /// Store whose listing always fails
    #[must_use]
    pub fn failing_lists() -> Self {
        Self {
            fail_lists: true,
            ..Self::default()
        }
    }

    /// Delay every append by `latency`
    #[must_use]
    pub fn with_append_latency(mut self, latency: Duration) -> Self {
        self.append_latency = Some(latency);
        self
    }

    /// Append requests received so far, failed ones included
    #[must_use]
    pub fn appended(&self) -> Vec<RecentEditRequest> {
        snapshot(&self.appended)
    }

    /// Get the call history for verification in tests
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        snapshot(&self.call_history)
    }
}

#[async_trait]
impl RecentEditsStore for MockStore {
    async fn append(&self, edit: &RecentEditRequest) -> Result<Option<RecentEditId>> {
        push(&self.call_history, "append".to_string());
        if let Some(latency) = self.append_latency {
            tokio::time::sleep(latency).await;
        }
        push(&self.appended, edit.clone());
        if self.fail_appends {
            return Err(SnapCleanError::persist_failed("HTTP 503: unavailable"));
        }
        let count = self.appended.lock().map(|items| items.len()).unwrap_or(0);
        Ok(Some(RecentEditId::Number(count as i64)))
    }

    async fn list_recent(&self) -> Result<Vec<RecentEdit>> {
        push(&self.call_history, "list_recent".to_string());
        if self.fail_lists {
            return Err(SnapCleanError::network_error(
                "Failed to fetch recent edits",
                "connection refused",
            ));
        }
        Ok(self.edits.clone())
    }
}
