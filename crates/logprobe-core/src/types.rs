//! Core types for test orchestration and message correlation.
//!
//! Explicit state, no implicit transitions: every result is built once and
//! only ever accumulated, never decremented.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// =============================================================================
// MessageIdentity
// =============================================================================

/// The unit of correlation: session counter × sequence number.
///
/// Rendered as `SSS/NNNNN` (zero padded) inside every generated message so the
/// identity can be recovered from whatever the daemon writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageIdentity {
    session: u32,
    sequence: u32,
}

impl MessageIdentity {
    /// Creates an identity from its parts.
    #[must_use]
    pub const fn new(session: u32, sequence: u32) -> Self {
        Self { session, sequence }
    }

    /// Returns the session counter component.
    #[must_use]
    pub const fn session(&self) -> u32 {
        self.session
    }

    /// Returns the sequence number within the burst (starts at 1).
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for MessageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}/{:05}", self.session, self.sequence)
    }
}

impl FromStr for MessageIdentity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let (session, sequence) = s
            .split_once('/')
            .ok_or_else(|| CoreError::identity(format!("missing '/' in {s:?}")))?;
        let session = session
            .parse()
            .map_err(|e| CoreError::identity(format!("session in {s:?}: {e}")))?;
        let sequence = sequence
            .parse()
            .map_err(|e| CoreError::identity(format!("sequence in {s:?}: {e}")))?;
        Ok(Self::new(session, sequence))
    }
}

// =============================================================================
// RetentionPolicy
// =============================================================================

/// How a sink may drop old entries under capacity pressure.
///
/// Entry ids are 0-based arrival ordinals within the sink's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RetentionPolicy {
    /// Every sent entry must appear.
    Unbounded,
    /// Only the newest `capacity` entries are guaranteed present.
    Bounded {
        /// Maximum number of entries the sink keeps.
        capacity: u64,
    },
}

impl RetentionPolicy {
    /// Ids that must still be observable after `total` entries were sent.
    #[must_use]
    pub fn retained(&self, total: u64) -> std::ops::Range<u64> {
        match *self {
            Self::Unbounded => 0..total,
            Self::Bounded { capacity } => total.saturating_sub(capacity)..total,
        }
    }

    /// Ids that must have been evicted after `total` entries were sent.
    #[must_use]
    pub fn evicted(&self, total: u64) -> std::ops::Range<u64> {
        0..self.retained(total).start
    }

    /// Upper bound on the number of entries a query may return.
    #[must_use]
    pub fn max_entries(&self, total: u64) -> u64 {
        match *self {
            Self::Unbounded => total,
            Self::Bounded { capacity } => total.min(capacity),
        }
    }
}

// =============================================================================
// Test case description
// =============================================================================

/// Configuration language understood by the daemon under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// The daemon's native block configuration syntax.
    #[default]
    Classic,
    /// Lua table based configuration.
    Lua,
}

impl Dialect {
    /// Returns the dialect tag passed to the daemon.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Lua => "lua",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discoverable test case definition.
///
/// Immutable once discovered; the configuration body is opaque to the core
/// apart from `@name@` placeholder substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseDescriptor {
    /// Unique case name.
    pub name: String,
    /// Daemon configuration body (template).
    pub config: String,
    /// Configuration language of `config`.
    pub dialect: Dialect,
}

impl TestCaseDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, config: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            name: name.into(),
            config: config.into(),
            dialect,
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Outcome reported by a test function body that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Verification matched.
    Pass,
    /// Verification mismatch, with expected/actual detail.
    Fail(String),
}

impl Outcome {
    /// Creates a failing outcome.
    #[must_use]
    pub fn fail(detail: impl Into<String>) -> Self {
        Self::Fail(detail.into())
    }

    /// Returns true if the outcome is a pass.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Pass/fail of one test function plus the captured failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFunctionResult {
    /// Test function name.
    pub name: String,
    /// Whether the function passed.
    pub passed: bool,
    /// Failure diagnostic (mismatch detail, error chain or panic message).
    pub diagnostic: Option<String>,
    /// Wall time spent in setUp, body and tearDown.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

impl TestFunctionResult {
    /// Creates a passing result.
    #[must_use]
    pub fn passed(name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            passed: true,
            diagnostic: None,
            elapsed,
        }
    }

    /// Creates a failing result with a diagnostic.
    #[must_use]
    pub fn failed(name: impl Into<String>, diagnostic: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            name: name.into(),
            passed: false,
            diagnostic: Some(diagnostic.into()),
            elapsed,
        }
    }

    /// Converts a completed outcome into a result.
    #[must_use]
    pub fn from_outcome(name: impl Into<String>, outcome: Outcome, elapsed: Duration) -> Self {
        match outcome {
            Outcome::Pass => Self::passed(name, elapsed),
            Outcome::Fail(detail) => Self::failed(name, detail, elapsed),
        }
    }
}

/// Terminal outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case name.
    pub name: String,
    /// True when `check_runnable` returned false.
    pub skipped: bool,
    /// Per function results, in execution order.
    pub functions: Vec<TestFunctionResult>,
}

impl CaseResult {
    /// Creates an empty result for a case that is about to run.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skipped: false,
            functions: Vec::new(),
        }
    }

    /// Creates the result of a skipped case; it contributes (0, 0).
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skipped: true,
            functions: Vec::new(),
        }
    }

    /// Records a function result.
    pub fn record(&mut self, result: TestFunctionResult) {
        self.functions.push(result);
    }

    /// Number of passing functions.
    #[must_use]
    pub fn succeeded(&self) -> u32 {
        self.functions.iter().filter(|f| f.passed).count() as u32
    }

    /// Number of failing functions.
    #[must_use]
    pub fn failed(&self) -> u32 {
        self.functions.iter().filter(|f| !f.passed).count() as u32
    }
}

/// Totals accumulated by the runner across every executed case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuiteResult {
    /// Passing test functions.
    pub succeeded: u32,
    /// Failing test functions.
    pub failed: u32,
}

impl TestSuiteResult {
    /// Creates an empty result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
        }
    }

    /// Adds a case's (succeeded, failed) pair.
    pub fn absorb(&mut self, case: &CaseResult) {
        self.succeeded = self.succeeded.saturating_add(case.succeeded());
        self.failed = self.failed.saturating_add(case.failed());
    }

    /// Total executed test functions.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.succeeded.saturating_add(self.failed)
    }

    /// Process exit status: the failure count, saturated to fit a byte.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::try_from(self.failed).unwrap_or(u8::MAX)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
