//! Error types for logprobe-core.
//!
//! All errors are explicit, no panics allowed.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error type for configuration, templating and identity handling.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Harness configuration is invalid or unreadable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configuration body references an unknown placeholder.
    #[error("template error: {0}")]
    Template(String),

    /// A message identity tag could not be parsed.
    #[error("invalid message identity: {0}")]
    Identity(String),
}

impl CoreError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Creates an identity parse error.
    #[must_use]
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }
}
