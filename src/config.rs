//! Configuration types for the removal client and workflow

use crate::error::{Result, SnapCleanError};
use crate::services::TimelineStep;
use crate::types::DEFAULT_DIMENSION;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the service base URL
pub const SERVER_URL_ENV: &str = "SNAPCLEAN_SERVER_URL";

/// Environment variable setting a request timeout in seconds
pub const TIMEOUT_ENV: &str = "SNAPCLEAN_TIMEOUT_SECS";

/// Connection settings for the background-removal service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL the `/api/...` paths are resolved against
    pub base_url: String,

    /// Request timeout in seconds (None = no client-side timeout)
    pub request_timeout_secs: Option<u64>,

    /// Dimension submitted for images whose size is unknown
    pub default_dimension: u32,

    /// Maximum number of recent edits kept for presentation
    pub recent_limit: usize,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: None, // Server-side timeout governs
            default_dimension: DEFAULT_DIMENSION,
            recent_limit: 20,
            user_agent: format!("snapclean/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Build a configuration from defaults overlaid with environment variables
    ///
    /// # Errors
    /// - `SNAPCLEAN_TIMEOUT_SECS` is not a number
    /// - The resulting configuration fails validation
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            builder = builder.base_url(url);
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                SnapCleanError::invalid_config(format!("{} must be seconds: {}", TIMEOUT_ENV, e))
            })?;
            builder = builder.request_timeout(Some(Duration::from_secs(secs)));
        }

        builder.build()
    }

    /// Request timeout as a `Duration`
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve an API path against the base URL
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Base URL empty or not http(s)
    /// - Zero default dimension or recent limit
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(SnapCleanError::invalid_config("Base URL cannot be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SnapCleanError::invalid_config(format!(
                "Unsupported base URL: {}. Expected http:// or https://",
                url
            )));
        }
        if self.default_dimension == 0 {
            return Err(SnapCleanError::invalid_config(
                "Default dimension must be greater than zero",
            ));
        }
        if self.recent_limit == 0 {
            return Err(SnapCleanError::invalid_config(
                "Recent edit limit must be greater than zero",
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(SnapCleanError::invalid_config(
                "Request timeout must be at least one second",
            ));
        }
        Ok(())
    }
}

/// Builder for `ClientConfig`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    #[must_use]
    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.config.base_url = url.into();
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    #[must_use]
    pub fn default_dimension(mut self, dimension: u32) -> Self {
        self.config.default_dimension = dimension;
        self
    }

    #[must_use]
    pub fn recent_limit(mut self, limit: usize) -> Self {
        self.config.recent_limit = limit;
        self
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, agent: S) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// See [`ClientConfig::validate`].
    pub fn build(self) -> Result<ClientConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}

/// Options handed to the picker or camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickOptions {
    /// Let the user (or adapter) crop in place before returning
    pub allow_editing: bool,
    /// Fixed crop aspect ratio as (width, height)
    pub aspect: (u32, u32),
    /// Lossy compression quality fraction in (0, 1]
    pub quality: f32,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            allow_editing: true,
            aspect: (1, 1),
            quality: 0.8,
        }
    }
}

impl PickOptions {
    /// Validate option ranges
    ///
    /// # Errors
    /// - Quality outside (0, 1]
    /// - Zero aspect component
    pub fn validate(&self) -> Result<()> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(SnapCleanError::invalid_config(format!(
                "Invalid quality: {} (valid range: 0.0 exclusive to 1.0)",
                self.quality
            )));
        }
        if self.aspect.0 == 0 || self.aspect.1 == 0 {
            return Err(SnapCleanError::invalid_config(format!(
                "Invalid aspect ratio: {}:{}",
                self.aspect.0, self.aspect.1
            )));
        }
        Ok(())
    }

    /// JPEG quality on the 1-100 scale
    #[must_use]
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Settings for a workflow controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Scripted processing steps shown while the removal call runs
    pub timeline: Vec<TimelineStep>,
    /// Options passed to the media source
    pub pick_options: PickOptions,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            timeline: TimelineStep::default_sequence(),
            pick_options: PickOptions::default(),
        }
    }
}

impl WorkflowConfig {
    #[must_use]
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder::default()
    }
}

/// Builder for `WorkflowConfig`
#[derive(Debug, Default)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    #[must_use]
    pub fn timeline(mut self, steps: Vec<TimelineStep>) -> Self {
        self.config.timeline = steps;
        self
    }

    /// Drop the scripted timeline entirely
    #[must_use]
    pub fn without_timeline(mut self) -> Self {
        self.config.timeline.clear();
        self
    }

    #[must_use]
    pub fn pick_options(mut self, options: PickOptions) -> Self {
        self.config.pick_options = options;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Invalid pick options
    pub fn build(self) -> Result<WorkflowConfig> {
        self.config.pick_options.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.default_dimension, 1000);
        assert_eq!(config.recent_limit, 20);
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_joining() {
        let config = ClientConfig::builder()
            .base_url("https://api.example.com/")
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint("/api/remove-background"),
            "https://api.example.com/api/remove-background"
        );
        assert_eq!(
            config.endpoint("api/recent-edits"),
            "https://api.example.com/api/recent-edits"
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(ClientConfig::builder().base_url("").build().is_err());
        assert!(ClientConfig::builder()
            .base_url("ftp://example.com")
            .build()
            .is_err());
        assert!(ClientConfig::builder().default_dimension(0).build().is_err());
        assert!(ClientConfig::builder().recent_limit(0).build().is_err());
        assert!(ClientConfig::builder()
            .request_timeout(Some(Duration::from_millis(10)))
            .build()
            .is_err());

        let err = ClientConfig::builder().base_url("").build().unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_pick_options() {
        let options = PickOptions::default();
        assert!(options.allow_editing);
        assert_eq!(options.aspect, (1, 1));
        assert_eq!(options.jpeg_quality(), 80);
        assert!(options.validate().is_ok());

        let bad = PickOptions {
            quality: 1.5,
            ..PickOptions::default()
        };
        assert!(bad.validate().is_err());

        let bad = PickOptions {
            aspect: (0, 1),
            ..PickOptions::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_workflow_config_builder() {
        let config = WorkflowConfig::builder().without_timeline().build().unwrap();
        assert!(config.timeline.is_empty());
        assert_eq!(WorkflowConfig::default().timeline.len(), 4);
    }
}
