//! Progress reporting.
//!
//! Banners are user-facing console output, kept apart from `tracing` events.
//! Formatting is pure so it can be tested without capturing stdout.

use chrono::Local;
use parking_lot::Mutex;

const RULE: &str = "##############################################";

/// Formats a banner; big banners are framed by rules.
#[must_use]
pub fn format_banner(message: &str, big: bool) -> String {
    if big {
        format!("\n{RULE}\n### {message}\n{RULE}\n")
    } else {
        format!("\n### {message}\n")
    }
}

/// Formats a timestamped progress line.
#[must_use]
pub fn format_progress(timestamp: &str, message: &str) -> String {
    format!("     {timestamp} {message}")
}

/// Side-effect only sink for suite progress.
pub trait Reporter: Send + Sync {
    /// A test function is about to run.
    fn announce_start(&self, name: &str);

    /// A test function finished.
    fn announce_end(&self, name: &str, passed: bool);

    /// Case level or summary banner.
    fn announce_banner(&self, text: &str);

    /// Free-form progress line (diagnostics, mismatch detail).
    fn progress(&self, text: &str);
}

/// Reporter writing banners and progress lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Creates a console reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn user_line(message: &str) {
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        println!("{}", format_progress(&now, message));
    }
}

impl Reporter for ConsoleReporter {
    fn announce_start(&self, name: &str) {
        println!("{}", format_banner(&format!("Starting testcase: {name}"), false));
        Self::user_line("Testcase start");
    }

    fn announce_end(&self, name: &str, passed: bool) {
        Self::user_line("Testcase end");
        let verdict = if passed { "PASS" } else { "FAIL" };
        println!("{}", format_banner(&format!("{verdict}: {name}"), false));
    }

    fn announce_banner(&self, text: &str) {
        println!("{}", format_banner(text, true));
    }

    fn progress(&self, text: &str) {
        Self::user_line(text);
    }
}

/// Event captured by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// `announce_start`.
    Start(String),
    /// `announce_end`.
    End {
        /// Test function name.
        name: String,
        /// Verdict.
        passed: bool,
    },
    /// `announce_banner`.
    Banner(String),
    /// `progress`.
    Progress(String),
}

/// Reporter that records events, for tests and JSON summaries.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl MemoryReporter {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    /// Names passed to `announce_start`, in order.
    #[must_use]
    pub fn started(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Start(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        self.events.lock().push(event);
    }
}

impl Reporter for MemoryReporter {
    fn announce_start(&self, name: &str) {
        self.push(ReportEvent::Start(name.to_string()));
    }

    fn announce_end(&self, name: &str, passed: bool) {
        self.push(ReportEvent::End {
            name: name.to_string(),
            passed,
        });
    }

    fn announce_banner(&self, text: &str) {
        self.push(ReportEvent::Banner(text.to_string()));
    }

    fn progress(&self, text: &str) {
        self.push(ReportEvent::Progress(text.to_string()));
    }
}
