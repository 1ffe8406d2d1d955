//! The test case capability.
//!
//! A test case bundles a daemon configuration with a set of test functions.
//! Hooks run in this order:
//!
//! ```text
//! check_runnable ─false─▶ Skipped
//!       │true
//!       ▼
//! initialize ─▶ for each test function:
//!                 set_up ─▶ run_test ─▶ tear_down
//!           ─▶ deinitialize ─▶ Done
//! ```
//!
//! The default `set_up`/`tear_down` start the daemon with the case's
//! configuration and stop it again.

use async_trait::async_trait;
use logprobe_core::{Outcome, TestCaseDescriptor};

use crate::context::TestContext;
use crate::error::Result;

/// Prefix marking a test function.
pub const TEST_FUNCTION_PREFIX: &str = "test";

/// A self-contained scenario with independently reported test functions.
#[async_trait]
pub trait TestCase: Send {
    /// Name, configuration body and dialect of the case.
    fn descriptor(&self) -> &TestCaseDescriptor;

    /// Names of the case's members. Only those starting with
    /// [`TEST_FUNCTION_PREFIX`] are run.
    fn test_functions(&self) -> &'static [&'static str];

    /// Whether the case can run here at all.
    fn check_runnable(&self, _ctx: &TestContext) -> bool {
        true
    }

    /// Case-wide setup before the first test function.
    async fn initialize(&mut self, _ctx: &mut TestContext) -> Result<()> {
        Ok(())
    }

    /// Case-wide teardown after the last test function.
    async fn deinitialize(&mut self, _ctx: &mut TestContext) -> Result<()> {
        Ok(())
    }

    /// Per-function setup; starts the daemon by default.
    async fn set_up(&mut self, ctx: &mut TestContext) -> Result<()> {
        ctx.start_daemon(self.descriptor()).await
    }

    /// Per-function teardown; stops the daemon by default.
    async fn tear_down(&mut self, ctx: &mut TestContext) -> Result<()> {
        ctx.stop_daemon().await
    }

    /// Runs one test function.
    ///
    /// A verification mismatch is an `Ok(Outcome::Fail(..))`; errors are for
    /// things that went wrong while trying.
    async fn run_test(&mut self, name: &str, ctx: &mut TestContext) -> Result<Outcome>;
}

/// Test functions of `case` in execution order: members with the test
/// prefix, sorted by name, without duplicates.
#[must_use]
pub fn test_function_names(case: &dyn TestCase) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = case
        .test_functions()
        .iter()
        .copied()
        .filter(|name| name.starts_with(TEST_FUNCTION_PREFIX))
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}
