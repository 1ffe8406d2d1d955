// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # logprobe-verify
//!
//! Verification engine: reads what the daemon produced and reconciles it
//! with what a test sent.
//!
//! Two modes:
//! - **Exact match**: a produced file must equal the concatenated expected
//!   lines byte for byte
//! - **Bounded retention**: a capacity-limited feed must hold the newest
//!   entries and must have evicted the oldest
//!
//! Artifacts are read after a settle delay and re-read with exponential
//! backoff until they match or the time budget runs out.
//!
//! ## Example
//!
//! ```rust,ignore
//! use logprobe_core::{HarnessConfig, RetentionPolicy};
//! use logprobe_verify::{FEED_BACKLOG, Verifier};
//!
//! let verifier = Verifier::from_config(&HarnessConfig::default());
//! let outcome = verifier
//!     .feed_retention(&expected, RetentionPolicy::Bounded { capacity: FEED_BACKLOG })
//!     .await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod feed;
pub mod file;
pub mod readiness;
pub mod retention;
pub mod verifier;

pub use error::{Result, VerifyError};
pub use feed::{FeedClient, FeedDocument, FeedEntry};
pub use file::{FileObservation, compare_exact, verify_file_exact};
pub use readiness::{PollSchedule, Polled, Probe};
pub use retention::RetentionReport;
pub use verifier::{FEED_BACKLOG, FEED_TITLE, Verifier};
