//! Verification error types.
//!
//! A mismatch between expected and produced artifacts is not an error; it is
//! reported as a failing [`logprobe_core::Outcome`]. Errors here mean the
//! artifact could not be obtained at all.

/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors raised while obtaining or decoding an artifact.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The query interface could not be reached before the deadline.
    #[error("failed to query {endpoint}: {source}")]
    Connect {
        /// `host:port` of the query interface.
        endpoint: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The response is not a well-formed feed.
    #[error("malformed feed response: {0}")]
    Malformed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VerifyError {
    /// Creates a malformed response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
