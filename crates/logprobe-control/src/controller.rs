//! Process controller contract.
//!
//! A test case asks its controller to start the daemon with a configuration
//! body before every test function and to stop it afterwards. Either
//! failing invalidates the rest of the suite, so callers treat errors from
//! this trait as fatal.

use std::sync::Arc;

use async_trait::async_trait;
use logprobe_core::Dialect;
use parking_lot::Mutex;

use crate::error::{ControlError, Result};

/// Starts and stops the daemon under test.
#[async_trait]
pub trait ProcessController: Send + Sync {
    /// Starts the daemon with `config` written in `dialect`.
    async fn start(&mut self, config: &str, verbose: bool, dialect: Dialect) -> Result<()>;

    /// Stops the daemon. Stopping a daemon that is not running succeeds.
    async fn stop(&mut self) -> Result<()>;

    /// Returns true while a started daemon has not been stopped.
    fn is_running(&self) -> bool;
}

/// A call observed by a [`ScriptedController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// `start` with the given configuration and dialect.
    Start {
        /// Configuration body.
        config: String,
        /// Dialect tag.
        dialect: Dialect,
    },
    /// `stop`.
    Stop,
}

/// Controller that records calls instead of spawning anything.
///
/// Used when the daemon is simulated in process. Clones share the event log
/// so a test can keep one handle and give the other to the harness.
#[derive(Debug, Clone, Default)]
pub struct ScriptedController {
    events: Arc<Mutex<Vec<ControlEvent>>>,
    fail_start: bool,
    stops_before_failure: Option<usize>,
    running: bool,
}

impl ScriptedController {
    /// Creates a controller whose calls all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `start` fail.
    #[must_use]
    pub const fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Makes every `stop` fail.
    #[must_use]
    pub const fn failing_stop(self) -> Self {
        self.failing_stop_after(0)
    }

    /// Lets the first `stops` calls to `stop` succeed and fails every later
    /// one. Clones share the count.
    #[must_use]
    pub const fn failing_stop_after(mut self, stops: usize) -> Self {
        self.stops_before_failure = Some(stops);
        self
    }

    /// Calls observed so far.
    #[must_use]
    pub fn events(&self) -> Vec<ControlEvent> {
        self.events.lock().clone()
    }

    /// Number of `start` calls observed.
    #[must_use]
    pub fn starts(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, ControlEvent::Start { .. }))
            .count()
    }
}

#[async_trait]
impl ProcessController for ScriptedController {
    async fn start(&mut self, config: &str, _verbose: bool, dialect: Dialect) -> Result<()> {
        self.events.lock().push(ControlEvent::Start {
            config: config.to_string(),
            dialect,
        });
        if self.fail_start {
            return Err(ControlError::scripted("start"));
        }
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        let earlier = {
            let mut events = self.events.lock();
            let earlier = events.iter().filter(|e| **e == ControlEvent::Stop).count();
            events.push(ControlEvent::Stop);
            earlier
        };
        if self.stops_before_failure.is_some_and(|allowed| earlier >= allowed) {
            return Err(ControlError::scripted("stop"));
        }
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
