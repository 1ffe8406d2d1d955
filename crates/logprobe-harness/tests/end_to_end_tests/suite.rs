//! Whole-suite runs: accounting, isolation and the fatal path.

use std::sync::Arc;
use std::time::Duration;

use logprobe_control::{ProcessController, ScriptedController};
use logprobe_core::{HarnessConfig, MemoryReporter, ReportEvent, TestSuiteResult};
use logprobe_harness::Runner;

use super::cases::{DELIVERY, PHANTOM};
use super::fake_daemon::FakeDaemon;

fn runner(daemon: &FakeDaemon, timeout: Duration, reporter: Arc<MemoryReporter>) -> Runner {
    let config = daemon.config(timeout);
    let verifier = daemon.verifier(&config);
    let controller = daemon.controller();
    Runner::new(config)
        .with_reporter(reporter)
        .with_verifier(verifier)
        .with_controllers(Arc::new(move |_: &HarnessConfig| {
            Box::new(controller.clone()) as Box<dyn ProcessController>
        }))
}

#[tokio::test]
async fn test_delivery_suite_passes() {
    let daemon = FakeDaemon::start().await;
    let reporter = Arc::new(MemoryReporter::new());

    let report = runner(&daemon, Duration::from_secs(5), Arc::clone(&reporter))
        .run(&[&DELIVERY])
        .await;

    for case in &report.cases {
        for function in &case.functions {
            assert!(function.passed, "{}: {:?}", function.name, function.diagnostic);
        }
    }
    assert_eq!(report.totals, TestSuiteResult { succeeded: 3, failed: 0 });
    assert_eq!(report.exit_code(), 0);
    assert_eq!(
        reporter.started(),
        [
            "test_feed_more_than_backlog",
            "test_feed_simple",
            "test_file_exact"
        ]
    );
    assert_eq!(
        reporter.events().last(),
        Some(&ReportEvent::Banner(
            "Results: all testcases:3, success:3 failure:0".into()
        ))
    );
}

#[tokio::test]
async fn test_feed_port_reaches_the_daemon_config() {
    let daemon = FakeDaemon::start().await;
    let config = daemon.config(Duration::from_secs(5));
    let port = config.ports.feed_port;
    let controller = daemon.controller();
    let observed = controller.clone();

    let report = Runner::new(config.clone())
        .with_reporter(Arc::new(MemoryReporter::new()))
        .with_verifier(daemon.verifier(&config))
        .with_controllers(Arc::new(move |_: &HarnessConfig| {
            Box::new(controller.clone()) as Box<dyn ProcessController>
        }))
        .run(&[&DELIVERY])
        .await;

    assert!(report.aborted.is_none());
    let configs = observed.configs();
    // one daemon start per test function
    assert_eq!(configs.len(), 3);
    assert!(configs[0].contains(&format!("rss(port({port})")));
    assert!(!configs[0].contains('@'));
}

#[tokio::test]
async fn test_missing_line_fails_only_its_function() {
    let daemon = FakeDaemon::start().await;
    let reporter = Arc::new(MemoryReporter::new());

    let report = runner(&daemon, Duration::from_millis(500), Arc::clone(&reporter))
        .run(&[&PHANTOM, &DELIVERY])
        .await;

    assert!(report.aborted.is_none());
    assert_eq!(report.totals, TestSuiteResult { succeeded: 3, failed: 1 });
    assert_eq!(report.exit_code(), 1);

    let phantom = &report.cases[0].functions[0];
    assert!(!phantom.passed);
    let diagnostic = phantom.diagnostic.as_deref().unwrap();
    assert!(diagnostic.contains("expected='"), "{diagnostic}");
    assert!(diagnostic.contains("999/00001"), "{diagnostic}");
    assert!(reporter.events().contains(&ReportEvent::End {
        name: "test_phantom_line".into(),
        passed: false
    }));
}

#[tokio::test]
async fn test_daemon_start_failure_aborts_the_suite() {
    let daemon = FakeDaemon::start().await;
    let config = daemon.config(Duration::from_millis(200));
    let reporter = Arc::new(MemoryReporter::new());
    let controller = ScriptedController::new().failing_start();

    let report = Runner::new(config)
        .with_reporter(reporter.clone())
        .with_controllers(Arc::new(move |_: &HarnessConfig| {
            Box::new(controller.clone()) as Box<dyn ProcessController>
        }))
        .run(&[&DELIVERY, &PHANTOM])
        .await;

    assert!(report.aborted.as_deref().unwrap().starts_with("Delivery:"));
    assert_eq!(report.cases.len(), 1);
    assert_eq!(report.totals.total(), 0);
    assert_ne!(report.exit_code(), 0);
    assert_eq!(reporter.started(), ["test_feed_more_than_backlog"]);
    assert!(!reporter
        .events()
        .contains(&ReportEvent::Banner("Running tests from test_case: Phantom".into())));
}
