// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # logprobe
//!
//! Functional test harness for log-processing daemons.
//!
//! - [`core`]: identities, message rendering, configuration, reporting
//! - [`transport`]: senders for sockets, pipes and files
//! - [`verify`]: exact file match and bounded feed retention checks
//! - [`control`]: starting and stopping the daemon under test
//! - [`harness`]: test case lifecycle, discovery and the suite runner
//! - [`cases`]: the test cases shipped with the harness
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use logprobe::prelude::*;
//!
//! let config = HarnessConfig::load("logprobe.toml")?;
//! let report = Runner::new(config).run(&discover()?).await;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cases;

pub use logprobe_control as control;
pub use logprobe_core as core;
pub use logprobe_harness as harness;
pub use logprobe_transport as transport;
pub use logprobe_verify as verify;

/// Prelude module for writing test cases.
pub mod prelude {
    pub use logprobe_core::{
        Dialect, ExpectedSet, HarnessConfig, MessageIdentity, Outcome, RetentionPolicy,
        TestCaseDescriptor,
    };
    pub use logprobe_harness::{
        HarnessError, Result, Runner, SuiteReport, TestCase, TestContext, discover,
        register_test_case,
    };
    pub use logprobe_transport::Transport;
    pub use logprobe_verify::FEED_BACKLOG;
}
