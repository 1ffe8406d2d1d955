//! Waiting for asynchronous delivery.
//!
//! The daemon writes artifacts on its own schedule. Instead of one fixed
//! sleep, verification waits a minimum settle delay and then re-reads the
//! artifact with exponential backoff until it is ready or the time budget is
//! spent. The delay is a minimum, never a guarantee: a run that exhausts the
//! budget reports the last observation as a failure.

use std::future::Future;
use std::time::{Duration, Instant};

use logprobe_core::config::VerifySection;

/// Result of one look at an artifact.
#[derive(Debug)]
pub enum Probe<T> {
    /// The artifact satisfies the check.
    Ready(T),
    /// Not yet; carries the observation for diagnostics.
    Pending(T),
}

/// Final observation after polling.
#[derive(Debug)]
pub struct Polled<T> {
    /// The last observation.
    pub value: T,
    /// Whether the last observation was ready.
    pub ready: bool,
    /// Number of probes performed.
    pub attempts: u32,
}

/// Settle delay plus exponential backoff schedule.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    /// Minimum wait before the first probe.
    pub settle_delay: Duration,
    /// Delay before the second probe.
    pub initial_backoff: Duration,
    /// Upper bound on a single delay.
    pub max_backoff: Duration,
    /// Multiplier applied per attempt.
    pub multiplier: f64,
    /// Total time budget, settle delay included.
    pub timeout: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from(&VerifySection::default())
    }
}

impl From<&VerifySection> for PollSchedule {
    fn from(section: &VerifySection) -> Self {
        Self {
            settle_delay: section.settle_delay,
            initial_backoff: section.initial_backoff,
            max_backoff: section.max_backoff,
            multiplier: section.multiplier,
            timeout: section.timeout,
        }
    }
}

impl PollSchedule {
    /// A schedule that probes exactly once, right away.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
            timeout: Duration::ZERO,
        }
    }

    /// Sets the settle delay.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the total time budget.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the initial backoff.
    #[must_use]
    pub const fn with_initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Delay after the given failed attempt (exponential, clamped).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_secs = self.initial_backoff.as_secs_f64();
        #[allow(clippy::cast_possible_wrap)] // attempt count stays far below i32::MAX
        let exp_secs = base_secs * self.multiplier.powi(attempt as i32);
        if !exp_secs.is_finite() || exp_secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(exp_secs).min(self.max_backoff)
    }

    /// Probes until ready or out of time.
    pub async fn poll<T, F, Fut>(&self, mut probe: F) -> Polled<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Probe<T>>,
    {
        let start = Instant::now();
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let mut attempt = 0;
        loop {
            let observation = probe().await;
            let attempts = attempt + 1;
            let value = match observation {
                Probe::Ready(value) => {
                    return Polled {
                        value,
                        ready: true,
                        attempts,
                    };
                }
                Probe::Pending(value) => value,
            };

            let delay = self.delay_for(attempt);
            if start.elapsed() + delay > self.timeout {
                tracing::debug!(attempts = attempts, elapsed = ?start.elapsed(), "artifact not ready before deadline");
                return Polled {
                    value,
                    ready: false,
                    attempts,
                };
            }
            tracing::debug!(attempt = attempts, delay = ?delay, "artifact not ready, backing off");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
