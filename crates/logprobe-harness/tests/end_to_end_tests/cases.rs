//! Test cases driven against the fake daemon.

use async_trait::async_trait;
use logprobe_core::{
    Dialect, ExpectedSet, MessageIdentity, MessageTemplate, Outcome, RetentionPolicy,
    TestCaseDescriptor,
};
use logprobe_harness::{Result, TestCase, TestCaseRegistration, TestContext};
use logprobe_transport::Transport;
use logprobe_verify::FEED_BACKLOG;

use super::fake_daemon::{INGRESS_SOCKET, OUTPUT_FILE};

pub const DELIVERY_CONFIG: &str = "\
source s_stream { unix-stream(\"log-stream\"); };
destination d_file { file(\"test-output.log\"); };
destination d_feed { rss(port(@feed_port@) title(\"syslog-ng\")); };
log { source(s_stream); destination(d_file); destination(d_feed); };
";

/// Sends over the ingress socket and checks both outputs.
pub struct Delivery {
    descriptor: TestCaseDescriptor,
}

impl Delivery {
    pub fn new(_verbose: bool) -> Self {
        Self {
            descriptor: TestCaseDescriptor::new("Delivery", DELIVERY_CONFIG, Dialect::Classic),
        }
    }
}

#[async_trait]
impl TestCase for Delivery {
    fn descriptor(&self) -> &TestCaseDescriptor {
        &self.descriptor
    }

    fn test_functions(&self) -> &'static [&'static str] {
        &[
            "test_feed_simple",
            "test_feed_more_than_backlog",
            "test_file_exact",
        ]
    }

    async fn run_test(&mut self, name: &str, ctx: &mut TestContext) -> Result<Outcome> {
        let stream = Transport::unix_stream(INGRESS_SOCKET);
        match name {
            "test_feed_simple" => {
                let _pin = ctx.counter().pin(1);
                let sent = ctx.sender(stream).send_messages("kakukk").await?;
                let expected: ExpectedSet = sent.into_iter().collect();
                Ok(ctx.verifier().feed_exact(&expected).await?)
            }
            "test_feed_more_than_backlog" => {
                let sent = ctx
                    .sender(stream)
                    .with_repeat(u32::try_from(FEED_BACKLOG).unwrap() + 2)
                    .send_messages("kakukk")
                    .await?;
                let expected: ExpectedSet = sent.into_iter().collect();
                Ok(ctx
                    .verifier()
                    .feed_retention(
                        &expected,
                        RetentionPolicy::Bounded {
                            capacity: FEED_BACKLOG,
                        },
                    )
                    .await?)
            }
            "test_file_exact" => {
                let sent = ctx
                    .sender(stream)
                    .with_repeat(10)
                    .send_messages("kakukk")
                    .await?;
                let expected: ExpectedSet = sent.into_iter().collect();
                Ok(ctx.verifier().file_exact(OUTPUT_FILE, &expected, None).await?)
            }
            other => Err(logprobe_harness::HarnessError::unknown_test("Delivery", other)),
        }
    }
}

fn delivery(verbose: bool) -> Box<dyn TestCase> {
    Box::new(Delivery::new(verbose))
}

pub static DELIVERY: TestCaseRegistration =
    TestCaseRegistration::new("end_to_end::test_delivery", "Delivery", delivery);

/// Expects one message more than it sends.
pub struct Phantom {
    descriptor: TestCaseDescriptor,
}

impl Phantom {
    pub fn new(_verbose: bool) -> Self {
        Self {
            descriptor: TestCaseDescriptor::new("Phantom", DELIVERY_CONFIG, Dialect::Classic),
        }
    }
}

#[async_trait]
impl TestCase for Phantom {
    fn descriptor(&self) -> &TestCaseDescriptor {
        &self.descriptor
    }

    fn test_functions(&self) -> &'static [&'static str] {
        &["test_phantom_line"]
    }

    async fn run_test(&mut self, _name: &str, ctx: &mut TestContext) -> Result<Outcome> {
        let sent = ctx
            .sender(Transport::unix_stream(INGRESS_SOCKET))
            .with_repeat(2)
            .send_messages("kakukk")
            .await?;
        let mut expected: ExpectedSet = sent.into_iter().collect();
        expected.extend([MessageTemplate::default().render(
            "kakukk",
            MessageIdentity::new(999, 1),
            "unix-stream(log-stream)",
        )]);
        Ok(ctx.verifier().file_exact(OUTPUT_FILE, &expected, None).await?)
    }
}

fn phantom(verbose: bool) -> Box<dyn TestCase> {
    Box::new(Phantom::new(verbose))
}

pub static PHANTOM: TestCaseRegistration =
    TestCaseRegistration::new("end_to_end::test_phantom", "Phantom", phantom);
