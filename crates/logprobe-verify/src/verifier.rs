//! Verification facade used by test functions.

use std::path::{Path, PathBuf};

use logprobe_core::{ExpectedSet, HarnessConfig, Outcome, RetentionPolicy};

use crate::error::Result;
use crate::feed::{FeedClient, FeedDocument};
use crate::file::{compare_exact, verify_file_exact};
use crate::readiness::{PollSchedule, Probe};
use crate::retention::RetentionReport;

/// Feed title configured on the feed destination.
pub const FEED_TITLE: &str = "syslog-ng";

/// Capacity of the feed destination's backlog.
pub const FEED_BACKLOG: u64 = 100;

/// Checks daemon artifacts against what a test sent.
#[derive(Debug, Clone)]
pub struct Verifier {
    schedule: PollSchedule,
    work_dir: PathBuf,
    feed: FeedClient,
    feed_link: String,
}

impl Verifier {
    /// Creates a verifier from the harness configuration.
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        let port = config.ports.feed_port;
        Self {
            schedule: PollSchedule::from(&config.verify),
            work_dir: config.daemon.working_dir.clone(),
            feed: FeedClient::new("localhost", port),
            feed_link: format!("localhost:{port}"),
        }
    }

    /// Replaces the poll schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replaces the feed endpoint.
    #[must_use]
    pub fn with_feed(mut self, client: FeedClient) -> Self {
        self.feed = client;
        self
    }

    /// Poll schedule in use.
    #[must_use]
    pub const fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    /// Resolves a daemon output path against the working directory.
    #[must_use]
    pub fn artifact(&self, name: impl AsRef<Path>) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Waits until the named output file equals the expected rendering.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub async fn file_exact(
        &self,
        name: impl AsRef<Path>,
        expected: &ExpectedSet,
        host_override: Option<&str>,
    ) -> Result<Outcome> {
        let path = self.artifact(name);
        verify_file_exact(&path, expected, host_override, &self.schedule).await
    }

    /// The exact feed response for `expected` delivered to a fresh sink.
    #[must_use]
    pub fn expected_feed(&self, expected: &ExpectedSet) -> FeedDocument {
        let mut doc = FeedDocument::new(FEED_TITLE, self.feed_link.as_str());
        for (id, message) in expected.messages().iter().enumerate() {
            doc.push(message.body.as_str(), id as u64);
        }
        doc
    }

    /// Waits until the feed response equals the rendering of `expected`.
    ///
    /// # Errors
    /// Returns the last query error if the feed never answered.
    pub async fn feed_exact(&self, expected: &ExpectedSet) -> Result<Outcome> {
        let want = self.expected_feed(expected).render();
        let want_ref = want.as_str();
        let polled = self
            .schedule
            .poll(|| async move {
                match self.feed.fetch().await {
                    Ok(body) if body == want_ref => Probe::Ready(Ok(body)),
                    other => Probe::Pending(other),
                }
            })
            .await;
        tracing::debug!(endpoint = %self.feed.endpoint(), attempts = polled.attempts, "checked feed");
        Ok(compare_exact(&want, &polled.value?))
    }

    /// Waits until the feed satisfies `policy` after `expected` was sent.
    ///
    /// # Errors
    /// Returns the last query error if the feed never answered.
    pub async fn feed_retention(
        &self,
        expected: &ExpectedSet,
        policy: RetentionPolicy,
    ) -> Result<Outcome> {
        let total = expected.len() as u64;
        let newest = expected.newest().map(|m| m.identity);
        let polled = self
            .schedule
            .poll(|| async move {
                let report = self
                    .feed
                    .query()
                    .await
                    .map(|doc| RetentionReport::check(policy, total, &doc, newest));
                match report {
                    Ok(report) if report.is_satisfied() => Probe::Ready(Ok(report)),
                    other => Probe::Pending(other),
                }
            })
            .await;
        let report = polled.value?;
        if !report.is_satisfied() {
            tracing::warn!(total = total, observed = report.observed, "feed retention not satisfied");
        }
        Ok(report.into_outcome())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logprobe_core::{MessageTemplate, SessionCounter};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn serve_feed(doc: FeedDocument) -> FeedClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let response = doc.render();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut req = [0u8; 64];
                let _ = stream.read(&mut req).await;
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        FeedClient::new("127.0.0.1", port)
    }

    fn sent(count: u32) -> ExpectedSet {
        let counter = SessionCounter::new();
        MessageTemplate::default()
            .render_burst("kakukk", counter.begin_burst(count), "unix-stream(log-stream)")
            .into_iter()
            .collect()
    }

    fn verifier() -> Verifier {
        Verifier::from_config(&HarnessConfig::default()).with_schedule(PollSchedule::immediate())
    }

    #[test]
    fn test_expected_feed_uses_message_bodies() {
        let expected = sent(1);
        let doc = verifier().expected_feed(&expected);
        assert_eq!(doc.link, "localhost:8081");
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.entries[0].id, 0);
        assert!(doc.entries[0].title.starts_with("kakukk 001/00001 unix-stream(log-stream) xxx"));
    }

    #[tokio::test]
    async fn test_feed_exact_single_message() {
        let expected = sent(1);
        let v = verifier();
        let client = serve_feed(v.expected_feed(&expected)).await;
        let outcome = v.with_feed(client).feed_exact(&expected).await.unwrap();
        assert_eq!(outcome, Outcome::Pass);
    }

    #[tokio::test]
    async fn test_feed_retention_overflow() {
        let expected = sent(102);
        let mut doc = FeedDocument::new(FEED_TITLE, "localhost:8081");
        for (id, message) in expected.messages().iter().enumerate().skip(2) {
            doc.push(message.body.as_str(), id as u64);
        }
        let client = serve_feed(doc).await;

        let outcome = verifier()
            .with_feed(client)
            .feed_retention(&expected, RetentionPolicy::Bounded { capacity: FEED_BACKLOG })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Pass);
    }

    #[tokio::test]
    async fn test_feed_retention_without_eviction_fails() {
        let expected = sent(102);
        let v = verifier();
        let client = serve_feed(v.expected_feed(&expected)).await;
        let outcome = v
            .with_feed(client)
            .feed_retention(&expected, RetentionPolicy::Bounded { capacity: FEED_BACKLOG })
            .await
            .unwrap();
        assert!(!outcome.is_pass());
    }

    #[tokio::test]
    async fn test_feed_unreachable_is_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = verifier()
            .with_feed(FeedClient::new("127.0.0.1", port))
            .feed_exact(&sent(1))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_file_exact_resolves_in_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HarnessConfig::default();
        config.daemon.working_dir = dir.path().to_path_buf();
        let expected = sent(2);
        std::fs::write(dir.path().join("test-lua.log"), expected.file_content(None)).unwrap();

        let v = Verifier::from_config(&config).with_schedule(PollSchedule::immediate());
        assert_eq!(v.artifact("x.log"), dir.path().join("x.log"));
        assert!(v.file_exact("test-lua.log", &expected, None).await.unwrap().is_pass());
    }
}
