//! Core data types shared by the media source, client and workflow

use serde::{Deserialize, Deserializer, Serialize};

/// Dimension used when the picker could not tell us the image size
pub const DEFAULT_DIMENSION: u32 = 1000;

/// Opaque handle plus optional pixel dimensions for a local or remote image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Scheme-dependent handle (file path URI, content handle or URL)
    pub uri: String,
    /// Width in pixels, when known
    pub width: Option<u32>,
    /// Height in pixels, when known
    pub height: Option<u32>,
}

impl ImageRef {
    /// Create an image reference, dropping zero dimensions as unknown
    pub fn new<S: Into<String>>(uri: S, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            uri: uri.into(),
            width: width.filter(|w| *w > 0),
            height: height.filter(|h| *h > 0),
        }
    }

    /// Create an image reference with unknown dimensions
    pub fn from_uri<S: Into<String>>(uri: S) -> Self {
        Self::new(uri, None, None)
    }

    /// Dimensions with unknown or zero values replaced by `default`
    #[must_use]
    pub fn dimensions_or(&self, default: u32) -> (u32, u32) {
        (
            self.width.filter(|w| *w > 0).unwrap_or(default),
            self.height.filter(|h| *h > 0).unwrap_or(default),
        )
    }
}

/// Output of a successful removal call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalResult {
    pub original_image_uri: String,
    pub processed_image_uri: String,
    pub image_width: u32,
    pub image_height: u32,
    /// Server-side processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Milliseconds from a JSON number that may carry a fraction or be null
fn whole_millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map_or(0, |ms| ms.round() as u64))
}

/// Store-assigned identifier of a recent edit
///
/// Backends hand out either numeric row ids or string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecentEditId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for RecentEditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A persisted record of one completed removal, owned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEdit {
    pub id: RecentEditId,
    pub original_image_uri: String,
    pub processed_image_uri: String,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default, deserialize_with = "whole_millis")]
    pub processing_time: u64,
}

impl RecentEdit {
    /// Rebuild the removal result this edit was recorded from
    #[must_use]
    pub fn to_result(&self) -> RemovalResult {
        RemovalResult {
            original_image_uri: self.original_image_uri.clone(),
            processed_image_uri: self.processed_image_uri.clone(),
            image_width: self.image_width,
            image_height: self.image_height,
            processing_time_ms: self.processing_time,
        }
    }
}

/// Wire formats for the removal service
pub mod wire {
    use super::{whole_millis, RecentEdit, RemovalResult};
    use serde::{Deserialize, Serialize};

    /// Body of `POST /api/remove-background`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RemoveBackgroundRequest {
        pub image_uri: String,
        pub image_width: u32,
        pub image_height: u32,
    }

    /// Success body of `POST /api/remove-background`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RemoveBackgroundResponse {
        pub original_image_uri: String,
        pub processed_image_uri: String,
        #[serde(default)]
        pub image_width: Option<u32>,
        #[serde(default)]
        pub image_height: Option<u32>,
        #[serde(default, deserialize_with = "whole_millis")]
        pub processing_time: u64,
    }

    impl RemoveBackgroundResponse {
        /// Convert into a result, falling back to the submitted dimensions
        #[must_use]
        pub fn into_result(self, submitted: &RemoveBackgroundRequest) -> RemovalResult {
            RemovalResult {
                original_image_uri: self.original_image_uri,
                processed_image_uri: self.processed_image_uri,
                image_width: self
                    .image_width
                    .filter(|w| *w > 0)
                    .unwrap_or(submitted.image_width),
                image_height: self
                    .image_height
                    .filter(|h| *h > 0)
                    .unwrap_or(submitted.image_height),
                processing_time_ms: self.processing_time,
            }
        }
    }

    /// Body of `POST /api/recent-edits`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RecentEditRequest {
        pub original_image_uri: String,
        pub processed_image_uri: String,
        pub image_width: u32,
        pub image_height: u32,
        pub processing_time: u64,
    }

    impl From<&RemovalResult> for RecentEditRequest {
        fn from(result: &RemovalResult) -> Self {
            Self {
                original_image_uri: result.original_image_uri.clone(),
                processed_image_uri: result.processed_image_uri.clone(),
                image_width: result.image_width,
                image_height: result.image_height,
                processing_time: result.processing_time_ms,
            }
        }
    }

    /// Body of `GET /api/recent-edits`
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct RecentEditsResponse {
        #[serde(default)]
        pub recent_edits: Vec<RecentEdit>,
    }
}
