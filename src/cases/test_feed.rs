//! Atom feed destination.
//!
//! The feed keeps the newest [`FEED_BACKLOG`] messages and serves them over
//! TCP. One message must come back byte-exact; sending past the backlog must
//! evict the oldest entries and keep the newest.

use async_trait::async_trait;
use logprobe_core::{Dialect, ExpectedSet, Outcome, RetentionPolicy, TestCaseDescriptor};
use logprobe_harness::{HarnessError, Result, TestCase, TestContext};
use logprobe_transport::Transport;
use logprobe_verify::FEED_BACKLOG;

const CONFIG: &str = r#"@version: 3.4

options { ts_format(iso); chain_hostnames(no); keep_hostname(yes); threaded(yes); };

source s_int { internal(); };
source s_test { unix-stream("log-stream" flags(expect-hostname)); };

destination d_feed { rss( port(@feed_port@) feed_title("syslog-ng") entry_title("${MESSAGE}") entry_description("${MESSAGE}") ); };

log { source(s_test); destination(d_feed); };
"#;

/// Socket the feed configuration listens on.
pub const SOCKET: &str = "log-stream";

/// Messages sent past the backlog capacity.
const OVERFLOW: u32 = 2;

/// Feed destination contents and capacity.
#[derive(Debug)]
pub struct TestFeed {
    descriptor: TestCaseDescriptor,
}

impl TestFeed {
    /// Creates the case.
    #[must_use]
    pub fn new(_verbose: bool) -> Self {
        Self {
            descriptor: TestCaseDescriptor::new("TestFeed", CONFIG, Dialect::Classic),
        }
    }

    async fn feed_simple(ctx: &TestContext) -> Result<Outcome> {
        // the expected document is written for session 1
        let _pin = ctx.counter().pin(1);
        let sent = ctx
            .sender(Transport::unix_stream(SOCKET))
            .send_messages("kakukk")
            .await?;
        let expected: ExpectedSet = sent.into_iter().collect();
        Ok(ctx.verifier().feed_exact(&expected).await?)
    }

    async fn feed_more_than_backlog(ctx: &TestContext) -> Result<Outcome> {
        let total = u32::try_from(FEED_BACKLOG).unwrap_or(u32::MAX).saturating_add(OVERFLOW);
        let sent = ctx
            .sender(Transport::unix_stream(SOCKET))
            .with_repeat(total)
            .send_messages("kakukk")
            .await?;
        let expected: ExpectedSet = sent.into_iter().collect();
        let policy = RetentionPolicy::Bounded {
            capacity: FEED_BACKLOG,
        };
        Ok(ctx.verifier().feed_retention(&expected, policy).await?)
    }
}

logprobe_harness::register_test_case!(TestFeed);

#[async_trait]
impl TestCase for TestFeed {
    fn descriptor(&self) -> &TestCaseDescriptor {
        &self.descriptor
    }

    fn test_functions(&self) -> &'static [&'static str] {
        &["test_feed_simple", "test_feed_more_than_backlog"]
    }

    fn check_runnable(&self, _ctx: &TestContext) -> bool {
        cfg!(unix)
    }

    async fn run_test(&mut self, name: &str, ctx: &mut TestContext) -> Result<Outcome> {
        match name {
            "test_feed_simple" => Self::feed_simple(ctx).await,
            "test_feed_more_than_backlog" => Self::feed_more_than_backlog(ctx).await,
            other => Err(HarnessError::unknown_test(&self.descriptor.name, other)),
        }
    }
}
