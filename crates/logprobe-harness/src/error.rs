//! Harness error types.
//!
//! Errors raised inside a test function are isolated: the lifecycle turns
//! them into a failed [`logprobe_core::TestFunctionResult`] and moves on.
//! [`HarnessError::is_fatal`] errors abort the whole run instead.

use logprobe_control::ControlError;
use logprobe_core::{CaseResult, CoreError};
use logprobe_transport::TransportError;
use logprobe_verify::VerifyError;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised while discovering or running test cases.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The process controller failed to start or stop the daemon.
    #[error("process controller failed: {0}")]
    Controller(#[from] ControlError),

    /// Test discovery failed.
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// Sending messages failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Reading an artifact failed.
    #[error("verification error: {0}")]
    Verify(#[from] VerifyError),

    /// Configuration or template error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A test case was asked to run a function it does not have.
    #[error("{case} has no test function {name}")]
    UnknownTest {
        /// Case name.
        case: String,
        /// Requested function.
        name: String,
    },

    /// A case hook failed.
    #[error("{0}")]
    Case(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Creates a discovery error.
    #[must_use]
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Creates a case hook error.
    #[must_use]
    pub fn case(msg: impl Into<String>) -> Self {
        Self::Case(msg.into())
    }

    /// Creates an unknown test function error.
    #[must_use]
    pub fn unknown_test(case: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownTest {
            case: case.into(),
            name: name.into(),
        }
    }

    /// Returns true if this error must abort the whole run.
    ///
    /// An unstartable or unstoppable daemon invalidates every later case, and
    /// a broken registry means the suite is not the one that was asked for.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Controller(_) | Self::Discovery(_))
    }
}

/// A case stopped by a fatal error.
///
/// `partial` holds the functions that finished before the error, so their
/// failures still count towards the suite totals.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct CaseAborted {
    /// Results recorded before the error.
    pub partial: CaseResult,
    /// The fatal error.
    #[source]
    pub error: HarnessError,
}
