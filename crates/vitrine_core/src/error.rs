//! Error types shared across the workspace

use thiserror::Error;

/// Failures a presentation feature can run into.
///
/// Every variant is recoverable: callers log it and skip the affected
/// feature, they never abort page initialization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VitrineError {
    /// A node the feature needs is not on the page
    #[error("Missing target: {0}")]
    MissingTarget(String),

    /// Text segmentation failed for an element
    #[error("Segmentation failed for {target}: {reason}")]
    Segmentation { target: String, reason: String },

    /// The tween or scroll-trigger collaborator rejected a request
    #[error("Animation engine error: {0}")]
    Engine(String),

    /// Invalid site configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl VitrineError {
    pub fn missing(what: impl Into<String>) -> Self {
        VitrineError::MissingTarget(what.into())
    }

    pub fn engine(reason: impl Into<String>) -> Self {
        VitrineError::Engine(reason.into())
    }

    /// True when the failure only means "nothing to activate"
    pub fn is_missing_target(&self) -> bool {
        matches!(self, VitrineError::MissingTarget(_))
    }
}

/// Result type for Vitrine operations
pub type Result<T> = std::result::Result<T, VitrineError>;
