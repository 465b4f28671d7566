//! HTTP client for the background-removal service and its recent-edits log
//!
//! The service is an opaque collaborator: one POST submits an image reference
//! and returns a processed one, and a small key-value log records completed
//! edits. Both seams are traits so the workflow can run against any backend.

use crate::config::ClientConfig;
use crate::error::{Result, SnapCleanError};
use crate::types::wire::{
    RecentEditRequest, RecentEditsResponse, RemoveBackgroundRequest, RemoveBackgroundResponse,
};
use crate::types::{ImageRef, RecentEdit, RecentEditId, RemovalResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, instrument, warn};

/// Path of the removal endpoint
pub const REMOVE_BACKGROUND_PATH: &str = "/api/remove-background";

/// Path of the recent-edits log
pub const RECENT_EDITS_PATH: &str = "/api/recent-edits";

/// Submits images for background removal
#[async_trait]
pub trait RemovalService: Send + Sync {
    /// Submit an image and wait for the processed result
    ///
    /// Exactly one attempt is made; there is no retry.
    ///
    /// # Errors
    /// - `InvalidImage` when the URI is empty
    /// - `RemovalFailed` on transport failure or non-success status
    /// - `MalformedResponse` when a success body does not parse
    async fn remove_background(&self, image: &ImageRef) -> Result<RemovalResult>;
}

/// Remote log of completed edits
#[async_trait]
pub trait RecentEditsStore: Send + Sync {
    /// Append an edit, returning the store-assigned id when the store reports one
    ///
    /// # Errors
    /// - `PersistFailed` on transport failure or non-success status
    async fn append(&self, edit: &RecentEditRequest) -> Result<Option<RecentEditId>>;

    /// Fetch recent edits in the order the store returns them
    ///
    /// # Errors
    /// - `Network` on transport failure or non-success status
    /// - `MalformedResponse` when the body does not parse
    async fn list_recent(&self) -> Result<Vec<RecentEdit>>;

    /// Record a finished removal
    ///
    /// # Errors
    /// Same as [`RecentEditsStore::append`].
    async fn record_recent_edit(&self, result: &RemovalResult) -> Result<Option<RecentEditId>> {
        self.append(&RecentEditRequest::from(result)).await
    }
}

/// reqwest-backed implementation of both service seams
#[derive(Debug, Clone)]
pub struct HttpRemovalClient {
    client: Client,
    config: ClientConfig,
}

impl HttpRemovalClient {
    /// Create a client for the configured service
    ///
    /// # Errors
    /// - Invalid configuration
    /// - Failed to create HTTP client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SnapCleanError::network_error("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the request body, coercing unknown dimensions
    fn submission_for(&self, image: &ImageRef) -> Result<RemoveBackgroundRequest> {
        if image.uri.trim().is_empty() {
            return Err(SnapCleanError::invalid_image("No image URI provided"));
        }
        let (image_width, image_height) = image.dimensions_or(self.config.default_dimension);
        Ok(RemoveBackgroundRequest {
            image_uri: image.uri.clone(),
            image_width,
            image_height,
        })
    }

    /// Pull an id out of whatever the append endpoint answered with
    fn parse_appended_id(body: &str) -> Option<RecentEditId> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let id = value
            .get("id")
            .or_else(|| value.get("recent_edit").and_then(|edit| edit.get("id")))?;
        serde_json::from_value(id.clone()).ok()
    }
}

#[async_trait]
impl RemovalService for HttpRemovalClient {
    #[instrument(skip(self), fields(uri = %image.uri))]
    async fn remove_background(&self, image: &ImageRef) -> Result<RemovalResult> {
        let request = self.submission_for(image)?;
        let url = self.config.endpoint(REMOVE_BACKGROUND_PATH);
        debug!(
            width = request.image_width,
            height = request.image_height,
            "Submitting image for background removal"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SnapCleanError::removal_failed(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        info!(status = status.as_u16(), "Removal service responded");

        let body = response.text().await.map_err(|e| {
            SnapCleanError::removal_failed(format!("Failed to read removal response: {}", e))
        })?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %body, "Removal service error");
            return Err(SnapCleanError::removal_status(status.as_u16(), &body));
        }

        let parsed: RemoveBackgroundResponse = serde_json::from_str(&body)
            .map_err(|e| SnapCleanError::malformed_response(REMOVE_BACKGROUND_PATH, e))?;

        if parsed.processed_image_uri.trim().is_empty() {
            return Err(SnapCleanError::malformed_response(
                REMOVE_BACKGROUND_PATH,
                "processedImageUri is empty",
            ));
        }

        Ok(parsed.into_result(&request))
    }
}

#[async_trait]
impl RecentEditsStore for HttpRemovalClient {
    #[instrument(skip(self, edit), fields(processed = %edit.processed_image_uri))]
    async fn append(&self, edit: &RecentEditRequest) -> Result<Option<RecentEditId>> {
        let url = self.config.endpoint(RECENT_EDITS_PATH);
        let response = self
            .client
            .post(&url)
            .json(edit)
            .send()
            .await
            .map_err(|e| SnapCleanError::persist_failed(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SnapCleanError::persist_failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        // The caller does not need the body; an id is a bonus when present.
        let body = response.text().await.unwrap_or_default();
        let id = Self::parse_appended_id(&body);
        debug!(id = ?id, "Recent edit recorded");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn list_recent(&self) -> Result<Vec<RecentEdit>> {
        let url = self.config.endpoint(RECENT_EDITS_PATH);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SnapCleanError::network_error(format!("Failed to fetch {}", url), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Recent edits unavailable");
            return Err(SnapCleanError::network_error(
                format!("Failed to fetch {}", url),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SnapCleanError::network_error("Failed to read recent edits", e))?;
        let parsed: RecentEditsResponse = serde_json::from_str(&body)
            .map_err(|e| SnapCleanError::malformed_response(RECENT_EDITS_PATH, e))?;

        let mut edits = parsed.recent_edits;
        edits.truncate(self.config.recent_limit);
        Ok(edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpRemovalClient {
        HttpRemovalClient::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_submission_defaults_missing_dimensions() {
        let request = client()
            .submission_for(&ImageRef::from_uri("content://media/42"))
            .unwrap();
        assert_eq!(request.image_width, 1000);
        assert_eq!(request.image_height, 1000);

        let request = client()
            .submission_for(&ImageRef::new("file:///a.jpg", Some(800), None))
            .unwrap();
        assert_eq!((request.image_width, request.image_height), (800, 1000));

        let zero_width = ImageRef {
            uri: "file:///a.jpg".to_string(),
            width: Some(0),
            height: None,
        };
        let request = client().submission_for(&zero_width).unwrap();
        assert_eq!((request.image_width, request.image_height), (1000, 1000));
    }

    #[test]
    fn test_submission_rejects_empty_uri() {
        let err = client()
            .submission_for(&ImageRef::from_uri("  "))
            .unwrap_err();
        assert!(matches!(err, SnapCleanError::InvalidImage(_)));
    }

    #[test]
    fn test_parse_appended_id() {
        assert_eq!(
            HttpRemovalClient::parse_appended_id(r#"{"id": 12}"#),
            Some(RecentEditId::Number(12))
        );
        assert_eq!(
            HttpRemovalClient::parse_appended_id(r#"{"recent_edit": {"id": "e-1"}}"#),
            Some(RecentEditId::Text("e-1".to_string()))
        );
        assert_eq!(HttpRemovalClient::parse_appended_id(""), None);
        assert_eq!(HttpRemovalClient::parse_appended_id(r#"{"ok": true}"#), None);
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = ClientConfig {
            base_url: String::new(),
            ..ClientConfig::default()
        };
        assert!(HttpRemovalClient::new(config).is_err());
    }
}
