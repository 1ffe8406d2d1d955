//! Transport error types.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors raised while emitting messages.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not open the channel.
    #[error("failed to connect to {channel}: {source}")]
    Connect {
        /// Channel description, e.g. `unix-stream(log-stream)`.
        channel: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A write or datagram send failed part way through a burst.
    #[error("failed to send message {sequence} over {channel}: {source}")]
    Send {
        /// Channel description.
        channel: String,
        /// Sequence number of the message that failed.
        sequence: u32,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The transport is not available on this platform.
    #[error("transport not supported on this platform: {0}")]
    NotSupported(String),
}

impl TransportError {
    /// Creates a connect error.
    #[must_use]
    pub fn connect(channel: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            channel: channel.into(),
            source,
        }
    }

    /// Creates a send error.
    #[must_use]
    pub fn send(channel: impl Into<String>, sequence: u32, source: std::io::Error) -> Self {
        Self::Send {
            channel: channel.into(),
            sequence,
            source,
        }
    }
}
