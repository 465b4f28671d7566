//! Error types for the removal workflow

use thiserror::Error;

/// Result type alias for workflow operations
pub type Result<T> = std::result::Result<T, SnapCleanError>;

/// Which runtime permission was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    /// Access to the photo library
    PhotoLibrary,
    /// Access to the camera
    Camera,
}

impl PermissionKind {
    /// Explanation shown to the user when this permission is denied
    #[must_use]
    pub fn denial_message(self) -> &'static str {
        match self {
            Self::PhotoLibrary => "Please allow access to your photos to continue.",
            Self::Camera => "Please allow camera access to take photos.",
        }
    }
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PhotoLibrary => write!(f, "photo library"),
            Self::Camera => write!(f, "camera"),
        }
    }
}

/// Error types for image acquisition, submission and persistence
#[derive(Error, Debug)]
pub enum SnapCleanError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The user refused a runtime permission
    #[error("Permission denied: {kind} access")]
    PermissionDenied { kind: PermissionKind },

    /// The media source could not produce an image
    #[error("Image selection failed: {0}")]
    Acquisition(String),

    /// The image reference is unusable (empty URI, zero dimensions)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Transport failure or non-success status from the removal endpoint
    #[error("{message}")]
    RemovalFailed {
        message: String,
        status: Option<u16>,
    },

    /// Success status with a body that does not parse
    #[error("Malformed response from {endpoint}: {details}")]
    MalformedResponse { endpoint: String, details: String },

    /// Recording a recent edit failed
    #[error("Failed to record recent edit: {0}")]
    PersistFailed(String),

    /// A workflow instance was driven out of order
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Network errors outside the removal call (downloads, client setup)
    #[error("Network error: {0}")]
    Network(String),
}

impl SnapCleanError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new acquisition error
    pub fn acquisition<S: Into<String>>(msg: S) -> Self {
        Self::Acquisition(msg.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new workflow ordering error
    pub fn workflow<S: Into<String>>(msg: S) -> Self {
        Self::Workflow(msg.into())
    }

    /// Create a new persistence error
    pub fn persist_failed<S: Into<String>>(msg: S) -> Self {
        Self::PersistFailed(msg.into())
    }

    /// Create a permission denial for the given source
    #[must_use]
    pub fn permission_denied(kind: PermissionKind) -> Self {
        Self::PermissionDenied { kind }
    }

    /// Create a removal failure without an HTTP status (transport errors)
    pub fn removal_failed<S: Into<String>>(msg: S) -> Self {
        Self::RemovalFailed {
            message: msg.into(),
            status: None,
        }
    }

    /// Create a removal failure from a non-success HTTP response
    ///
    /// The raw response text is kept so it can be shown to the user.
    #[must_use]
    pub fn removal_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("Background removal failed (HTTP {})", status)
        } else {
            format!("Background removal failed (HTTP {}): {}", status, body)
        };
        Self::RemovalFailed {
            message,
            status: Some(status),
        }
    }

    /// Create a malformed response error for an endpoint
    pub fn malformed_response<E: Into<String>, D: std::fmt::Display>(
        endpoint: E,
        details: D,
    ) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            details: details.to_string(),
        }
    }

    /// Create network error with operation context
    pub fn network_error<S: Into<String>, E: std::fmt::Display>(context: S, error: E) -> Self {
        Self::Network(format!("{}: {}", context.into(), error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Whether this error belongs to the submission family
    ///
    /// Malformed responses are handled exactly like removal failures.
    #[must_use]
    pub fn is_removal_failure(&self) -> bool {
        matches!(
            self,
            Self::RemovalFailed { .. } | Self::MalformedResponse { .. }
        )
    }
}
