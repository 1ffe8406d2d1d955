//! Message rendering and the expected set.
//!
//! Every generated message carries its [`MessageIdentity`] in the body:
//!
//! ```text
//! <7>2004-02-11T21:27:22+01:00 bzorp prog[4711]: kakukk 001/00001 unix-stream(log-stream) xxxx...
//! ```
//!
//! The body (`kakukk 001/00001 unix-stream(log-stream) xxxx...`) is what the
//! daemon stores as the message text, so the identity survives into files and
//! feeds regardless of delivery timing.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};

use crate::identity::Burst;
use crate::types::MessageIdentity;

/// Padding appended to every message body by default.
pub const DEFAULT_PADDING: usize = 250;

/// Header fields and padding used to render messages.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    /// Syslog priority value (facility * 8 + severity).
    pub priority: u8,
    /// Timestamp written into every message.
    pub timestamp: DateTime<FixedOffset>,
    /// Hostname field.
    pub hostname: String,
    /// Program name field.
    pub program: String,
    /// Pid field.
    pub pid: u32,
    /// Number of `x` characters appended to the body.
    pub padding: usize,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            priority: 7,
            timestamp: fixed_local_timestamp(),
            hostname: "bzorp".to_string(),
            program: "prog".to_string(),
            pid: std::process::id(),
            padding: DEFAULT_PADDING,
        }
    }
}

/// A fixed wall-clock instant expressed in the local offset.
///
/// The daemon re-renders timestamps in local time, so using the local offset
/// makes the round trip byte-identical.
fn fixed_local_timestamp() -> DateTime<FixedOffset> {
    let naive = NaiveDate::from_ymd_opt(2004, 2, 11)
        .and_then(|d| d.and_hms_opt(21, 27, 22))
        .unwrap_or_default();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive).fixed_offset())
}

impl MessageTemplate {
    /// Sets the hostname field.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Sets the program name field.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the pid field.
    #[must_use]
    pub const fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    /// Sets the padding length.
    #[must_use]
    pub const fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Sets the timestamp.
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Renders one message for `identity` sent over `channel`.
    #[must_use]
    pub fn render(&self, payload: &str, identity: MessageIdentity, channel: &str) -> RenderedMessage {
        let body = format!(
            "{payload} {identity} {channel} {}",
            "x".repeat(self.padding)
        );
        RenderedMessage {
            identity,
            channel: channel.to_string(),
            priority: self.priority,
            timestamp: self.timestamp.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            hostname: self.hostname.clone(),
            program: self.program.clone(),
            pid: self.pid,
            body,
        }
    }

    /// Renders every identity of a burst.
    #[must_use]
    pub fn render_burst(&self, payload: &str, burst: Burst, channel: &str) -> Vec<RenderedMessage> {
        burst
            .map(|identity| self.render(payload, identity, channel))
            .collect()
    }
}

/// One generated message, immutable after rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Correlation identity.
    pub identity: MessageIdentity,
    /// Transport description embedded in the body.
    pub channel: String,
    priority: u8,
    timestamp: String,
    hostname: String,
    program: String,
    pid: u32,
    /// Message text as the daemon stores it.
    pub body: String,
}

impl RenderedMessage {
    /// Syslog line as transmitted, without framing.
    #[must_use]
    pub fn wire(&self) -> String {
        format!(
            "<{}>{} {} {}[{}]: {}",
            self.priority, self.timestamp, self.hostname, self.program, self.pid, self.body
        )
    }

    /// Line a file destination writes for this message.
    ///
    /// `host_override` replaces the hostname when the source rewrites it.
    #[must_use]
    pub fn file_line(&self, host_override: Option<&str>) -> String {
        format!(
            "{} {} {}[{}]: {}\n",
            self.timestamp,
            host_override.unwrap_or(&self.hostname),
            self.program,
            self.pid,
            self.body
        )
    }
}

/// The ordered messages a test claims to have sent.
///
/// Built incrementally while sending and consumed by verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedSet {
    messages: Vec<RenderedMessage>,
}

impl ExpectedSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends messages in send order.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = RenderedMessage>) {
        self.messages.extend(messages);
    }

    /// Number of expected messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if nothing was sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in send order.
    #[must_use]
    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    /// Identities in send order.
    pub fn identities(&self) -> impl Iterator<Item = MessageIdentity> + '_ {
        self.messages.iter().map(|m| m.identity)
    }

    /// The most recently sent message.
    #[must_use]
    pub fn newest(&self) -> Option<&RenderedMessage> {
        self.messages.last()
    }

    /// Concatenation of the file lines of every message, in send order.
    #[must_use]
    pub fn file_content(&self, host_override: Option<&str>) -> String {
        self.messages
            .iter()
            .map(|m| m.file_line(host_override))
            .collect()
    }
}

impl FromIterator<RenderedMessage> for ExpectedSet {
    fn from_iter<I: IntoIterator<Item = RenderedMessage>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}
