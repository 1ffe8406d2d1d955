//! Message correlation through the daemon: identities, exact rendering and
//! bounded feed retention.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use logprobe_core::{
    Dialect, ExpectedSet, MemoryReporter, MessageIdentity, MessageTemplate, Outcome,
    TestCaseDescriptor,
};
use logprobe_harness::TestContext;
use logprobe_transport::Transport;
use logprobe_verify::FEED_BACKLOG;

use super::cases::DELIVERY_CONFIG;
use super::fake_daemon::{FakeDaemon, INGRESS_SOCKET, OUTPUT_FILE};

async fn started_context(daemon: &FakeDaemon) -> TestContext {
    let config = daemon.config(Duration::from_secs(5));
    let verifier = daemon.verifier(&config);
    let mut ctx = TestContext::new(
        Arc::new(config),
        Box::new(daemon.controller()),
        Arc::new(MemoryReporter::new()),
    )
    .with_verifier(verifier);
    let descriptor = TestCaseDescriptor::new("Correlation", DELIVERY_CONFIG, Dialect::Classic);
    ctx.start_daemon(&descriptor).await.unwrap();
    ctx
}

#[tokio::test]
async fn test_backlog_keeps_the_newest_entries() {
    let daemon = FakeDaemon::start().await;
    let ctx = started_context(&daemon).await;

    let sent = ctx
        .sender(Transport::unix_stream(INGRESS_SOCKET))
        .with_repeat(102)
        .send_messages("kakukk")
        .await
        .unwrap();
    let expected: ExpectedSet = sent.into_iter().collect();
    // wait for delivery through the file output
    assert!(
        ctx.verifier()
            .file_exact(OUTPUT_FILE, &expected, None)
            .await
            .unwrap()
            .is_pass()
    );

    let feed = daemon.feed_client().query().await.unwrap();
    assert_eq!(feed.entries.len() as u64, FEED_BACKLOG);
    assert!(feed.contains_id(101));
    assert!(feed.contains_id(2));
    assert!(!feed.contains_id(1));
    assert!(!feed.contains_id(0));
    assert!(feed.entry(101).unwrap().title.contains("001/00102"));
}

#[tokio::test]
async fn test_file_line_is_byte_exact() {
    let daemon = FakeDaemon::start().await;
    let template = MessageTemplate::default()
        .with_pid(4711)
        .with_padding(5)
        .with_timestamp(DateTime::parse_from_rfc3339("2004-02-11T21:27:22+01:00").unwrap());
    let ctx = started_context(&daemon).await.with_template(template);

    let _pin = ctx.counter().pin(1);
    let sent = ctx
        .sender(Transport::unix_stream(INGRESS_SOCKET))
        .send_messages("kakukk")
        .await
        .unwrap();
    let expected: ExpectedSet = sent.into_iter().collect();
    let outcome = ctx
        .verifier()
        .file_exact(OUTPUT_FILE, &expected, None)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Pass);

    let written = std::fs::read_to_string(daemon.dir().join(OUTPUT_FILE)).unwrap();
    assert_eq!(
        written,
        "2004-02-11T21:27:22+01:00 bzorp prog[4711]: kakukk 001/00001 unix-stream(log-stream) xxxxx\n"
    );
}

#[tokio::test]
async fn test_bursts_get_distinct_sessions() {
    let daemon = FakeDaemon::start().await;
    let ctx = started_context(&daemon).await;
    let sender = ctx
        .sender(Transport::unix_stream(INGRESS_SOCKET))
        .with_repeat(2);

    let mut expected = ExpectedSet::new();
    for _ in 0..3 {
        expected.extend(sender.send_messages("kakukk").await.unwrap());
        // one burst at a time keeps the file in send order
        assert!(
            ctx.verifier()
                .file_exact(OUTPUT_FILE, &expected, None)
                .await
                .unwrap()
                .is_pass()
        );
    }

    let written = std::fs::read_to_string(daemon.dir().join(OUTPUT_FILE)).unwrap();
    let identities: Vec<MessageIdentity> = written
        .lines()
        .map(|line| line.split(' ').nth(4).unwrap().parse().unwrap())
        .collect();
    assert_eq!(
        identities,
        [
            MessageIdentity::new(1, 1),
            MessageIdentity::new(1, 2),
            MessageIdentity::new(2, 1),
            MessageIdentity::new(2, 2),
            MessageIdentity::new(3, 1),
            MessageIdentity::new(3, 2),
        ]
    );
}

#[tokio::test]
async fn test_restart_resets_feed_ids() {
    let daemon = FakeDaemon::start().await;
    let mut ctx = started_context(&daemon).await;
    let stream = Transport::unix_stream(INGRESS_SOCKET);

    let first: ExpectedSet = ctx
        .sender(stream.clone())
        .with_repeat(3)
        .send_messages("kakukk")
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert!(ctx.verifier().feed_exact(&first).await.unwrap().is_pass());

    ctx.stop_daemon().await.unwrap();
    let descriptor = TestCaseDescriptor::new("Correlation", DELIVERY_CONFIG, Dialect::Classic);
    ctx.start_daemon(&descriptor).await.unwrap();

    let second: ExpectedSet = ctx
        .sender(stream)
        .send_messages("kakukk")
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert!(ctx.verifier().feed_exact(&second).await.unwrap().is_pass());
    let feed = daemon.feed_client().query().await.unwrap();
    assert_eq!(feed.ids().collect::<Vec<_>>(), [0]);
}
