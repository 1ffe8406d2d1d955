// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # logprobe-harness
//!
//! Test orchestration for logprobe:
//!
//! - **Discovery**: cases self-register with [`register_test_case!`] and are
//!   found without a master list
//! - **Lifecycle**: `check_runnable`, `initialize`, per function
//!   `set_up`/`run_test`/`tear_down`, `deinitialize`
//! - **Isolation**: errors and panics inside a test function fail only that
//!   function; controller failures abort the run
//! - **Runner**: aggregates `(succeeded, failed)` totals into a
//!   [`SuiteReport`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use logprobe_core::HarnessConfig;
//! use logprobe_harness::{Runner, discover};
//!
//! let cases = discover()?;
//! let report = Runner::new(HarnessConfig::default()).run(&cases).await;
//! std::process::exit(i32::from(report.exit_code()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod case;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod runner;

pub use case::{TEST_FUNCTION_PREFIX, TestCase, test_function_names};
pub use context::TestContext;
pub use error::{CaseAborted, HarnessError, Result};
pub use lifecycle::{run_case, run_test_function};
pub use registry::{CaseFactory, TestCaseRegistration, discover, discover_from, select};
pub use runner::{ControllerFactory, Runner, SuiteReport};

#[doc(hidden)]
pub use inventory;
