// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # logprobe-control
//!
//! Starts and stops the daemon under test.
//!
//! - [`ProcessController`]: the contract test cases drive from `set_up` and
//!   `tear_down`
//! - [`DaemonController`]: writes the configuration body, spawns the binary,
//!   waits for readiness and stops it with SIGTERM then SIGKILL
//! - [`ScriptedController`]: records calls for in-process daemons
//!
//! Controller failures invalidate the remaining suite; the harness treats
//! them as fatal.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod controller;
pub mod error;
pub mod native;

pub use controller::{ControlEvent, ProcessController, ScriptedController};
pub use error::{ControlError, Result};
pub use native::DaemonController;
