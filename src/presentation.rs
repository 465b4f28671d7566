//! Per-screen presentation state
//!
//! Each view owns its state explicitly; it is created when the screen mounts
//! and dropped when it unmounts. Nothing here talks to the removal service.

use crate::client::RecentEditsStore;
use crate::tracing_config::spans;
use crate::types::{RecentEdit, RemovalResult};
use crate::workflow::{Delivery, ResultOrigin};
use tracing::{debug, warn, Instrument};

/// Home screen: the recent-edits strip
#[derive(Debug, Clone, Default)]
pub struct HomeView {
    pub recent_edits: Vec<RecentEdit>,
    pub loading: bool,
}

impl HomeView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload the strip from the store
    ///
    /// Any failure leaves the strip empty; the home screen never shows an error.
    pub async fn refresh(&mut self, store: &dyn RecentEditsStore) {
        self.loading = true;
        self.recent_edits = match store
            .list_recent()
            .instrument(spans::recent_edits_fetch())
            .await
        {
            Ok(edits) => {
                debug!(count = edits.len(), "Loaded recent edits");
                edits
            },
            Err(e) => {
                warn!(error = %e, "Error fetching recent edits");
                Vec::new()
            },
        };
        self.loading = false;
    }

    /// The edit behind the thumbnail at `index`
    #[must_use]
    pub fn open(&self, index: usize) -> Option<&RecentEdit> {
        self.recent_edits.get(index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent_edits.is_empty()
    }
}

/// Lower and upper bound of every enhancement slider
pub const ENHANCEMENT_RANGE: (i32, i32) = (-100, 100);

/// Slider values on the results screen
///
/// Purely presentational; they are never sent anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enhancements {
    pub brightness: i32,
    pub contrast: i32,
    pub sharpness: i32,
}

fn clamp_enhancement(value: i32) -> i32 {
    value.clamp(ENHANCEMENT_RANGE.0, ENHANCEMENT_RANGE.1)
}

impl Enhancements {
    pub fn set_brightness(&mut self, value: i32) {
        self.brightness = clamp_enhancement(value);
    }

    pub fn set_contrast(&mut self, value: i32) {
        self.contrast = clamp_enhancement(value);
    }

    pub fn set_sharpness(&mut self, value: i32) {
        self.sharpness = clamp_enhancement(value);
    }

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Results screen state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    result: RemovalResult,
    origin: ResultOrigin,
    show_original: bool,
    enhancements: Enhancements,
}

impl ResultsView {
    #[must_use]
    pub fn new(delivery: &Delivery) -> Self {
        Self {
            result: delivery.result.clone(),
            origin: delivery.origin.clone(),
            show_original: false,
            enhancements: Enhancements::default(),
        }
    }

    #[must_use]
    pub fn result(&self) -> &RemovalResult {
        &self.result
    }

    #[must_use]
    pub fn origin(&self) -> &ResultOrigin {
        &self.origin
    }

    #[must_use]
    pub fn show_original(&self) -> bool {
        self.show_original
    }

    /// Flip between the original and the processed image
    pub fn toggle_comparison(&mut self) -> bool {
        self.show_original = !self.show_original;
        self.show_original
    }

    /// URI of the image currently on screen
    #[must_use]
    pub fn displayed_uri(&self) -> &str {
        if self.show_original {
            &self.result.original_image_uri
        } else {
            &self.result.processed_image_uri
        }
    }

    #[must_use]
    pub fn enhancements(&self) -> &Enhancements {
        &self.enhancements
    }

    pub fn enhancements_mut(&mut self) -> &mut Enhancements {
        &mut self.enhancements
    }

    pub fn reset_enhancements(&mut self) {
        self.enhancements = Enhancements::default();
    }
}
