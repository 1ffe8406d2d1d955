// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # logprobe-core
//!
//! Core data model and message-correlation primitives for logprobe, a
//! functional test harness for log-processing daemons.
//!
//! This crate provides:
//!
//! - [`MessageIdentity`], [`SessionCounter`] and [`Burst`] for numbering
//!   generated messages so they can be recognised in the daemon's output
//! - [`MessageTemplate`] and [`ExpectedSet`] for rendering messages and
//!   recording what was sent
//! - [`RetentionPolicy`] for capacity-bounded sinks
//! - [`HarnessConfig`] for the harness' own TOML configuration
//! - [`Reporter`] implementations for start/end/summary banners
//!
//! ## Example
//!
//! ```rust
//! use logprobe_core::{ExpectedSet, MessageTemplate, SessionCounter};
//!
//! let counter = SessionCounter::new();
//! let mut expected = ExpectedSet::new();
//! let burst = counter.begin_burst(10);
//! expected.extend(MessageTemplate::default().render_burst("kakukk", burst, "unix-stream(log)"));
//! assert_eq!(expected.len(), 10);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod report;
pub mod types;

pub use config::{HarnessConfig, render_template};
pub use error::{CoreError, Result};
pub use identity::{Burst, SessionCounter, SessionPin};
pub use message::{ExpectedSet, MessageTemplate, RenderedMessage};
pub use report::{ConsoleReporter, MemoryReporter, ReportEvent, Reporter};
pub use types::{
    CaseResult, Dialect, MessageIdentity, Outcome, RetentionPolicy, TestCaseDescriptor,
    TestFunctionResult, TestSuiteResult,
};
