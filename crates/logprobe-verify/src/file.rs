//! Exact match of a file produced by the daemon.

use std::path::Path;

use logprobe_core::{ExpectedSet, Outcome};

use crate::error::Result;
use crate::readiness::{PollSchedule, Probe};

/// What the file looked like on the last probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileObservation {
    /// The file did not exist yet.
    Missing,
    /// The file content.
    Content(String),
}

/// Compares `actual` with `expected` byte for byte.
///
/// On mismatch the outcome carries both values and the first differing line.
#[must_use]
pub fn compare_exact(expected: &str, actual: &str) -> Outcome {
    if expected == actual {
        return Outcome::Pass;
    }
    let mut detail = format!("file contents mismatch: expected='{expected}' actual='{actual}'");
    if let Some(line) = first_difference(expected, actual) {
        detail.push_str(&format!("; first difference at line {line}"));
    }
    Outcome::fail(detail)
}

/// 1-based number of the first line that differs, if any.
fn first_difference(expected: &str, actual: &str) -> Option<usize> {
    let mut exp = expected.split_inclusive('\n');
    let mut act = actual.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (exp.next(), act.next()) {
            (None, None) => return None,
            (a, b) if a != b => return Some(line),
            _ => line += 1,
        }
    }
}

/// Waits for `path` to equal the file rendering of `expected`.
///
/// A missing file counts as not yet delivered. Other read errors are returned.
///
/// # Errors
/// Returns an error if the file exists but cannot be read.
pub async fn verify_file_exact(
    path: &Path,
    expected: &ExpectedSet,
    host_override: Option<&str>,
    schedule: &PollSchedule,
) -> Result<Outcome> {
    let want = expected.file_content(host_override);
    let want_ref = want.as_str();
    let polled = schedule
        .poll(|| {
            async move {
                match tokio::fs::read(path).await {
                    Ok(bytes) => {
                        let content = String::from_utf8_lossy(&bytes).into_owned();
                        if content == want_ref {
                            Probe::Ready(Ok(FileObservation::Content(content)))
                        } else {
                            Probe::Pending(Ok(FileObservation::Content(content)))
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Probe::Pending(Ok(FileObservation::Missing))
                    }
                    Err(e) => Probe::Ready(Err(e)),
                }
            }
        })
        .await;

    tracing::debug!(
        path = %path.display(),
        attempts = polled.attempts,
        ready = polled.ready,
        "checked file"
    );
    Ok(match polled.value? {
        FileObservation::Missing => Outcome::fail(format!(
            "{} was not created; expected='{want}'",
            path.display()
        )),
        FileObservation::Content(actual) => compare_exact(&want, &actual),
    })
}
