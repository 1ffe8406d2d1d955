//! Suite runner.
//!
//! Instantiates every discovered case, runs it in a fresh
//! [`TestContext`](crate::TestContext) and accumulates the totals. A fatal
//! error stops the run on the spot; results gathered so far are kept and the
//! report is marked as aborted.

use std::sync::Arc;

use logprobe_control::{DaemonController, ProcessController};
use logprobe_core::{
    CaseResult, ConsoleReporter, HarnessConfig, MessageTemplate, Reporter, TestSuiteResult,
};
use logprobe_verify::Verifier;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::context::TestContext;
use crate::error::CaseAborted;
use crate::lifecycle::run_case;
use crate::registry::TestCaseRegistration;

/// Creates the controller for one test case.
pub type ControllerFactory = Arc<dyn Fn(&HarnessConfig) -> Box<dyn ProcessController> + Send + Sync>;

/// Outcome of a suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Run id, also attached to every tracing event of the run.
    pub run_id: Uuid,
    /// Accumulated totals.
    pub totals: TestSuiteResult,
    /// Per case results in execution order.
    pub cases: Vec<CaseResult>,
    /// Fatal error that stopped the run, if any.
    pub aborted: Option<String>,
}

impl SuiteReport {
    /// Process exit status.
    ///
    /// The failure count, plus one when the run was aborted, saturated to a
    /// byte. Zero means every test function passed.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        let failed = self.totals.failed;
        let code = if self.aborted.is_some() {
            failed.saturating_add(1)
        } else {
            failed
        };
        u8::try_from(code).unwrap_or(u8::MAX)
    }
}

/// Runs discovered test cases one after another.
pub struct Runner {
    config: Arc<HarnessConfig>,
    reporter: Arc<dyn Reporter>,
    controllers: ControllerFactory,
    verifier: Option<Verifier>,
    template: Option<MessageTemplate>,
    run_id: Uuid,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("run_id", &self.run_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Creates a runner that spawns the configured daemon and reports to
    /// stdout.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config: Arc::new(config),
            reporter: Arc::new(ConsoleReporter::new()),
            controllers: Arc::new(|config: &HarnessConfig| {
                Box::new(DaemonController::new(config.daemon.clone())) as Box<dyn ProcessController>
            }),
            verifier: None,
            template: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// Replaces the reporter.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replaces how controllers are created.
    #[must_use]
    pub fn with_controllers(mut self, factory: ControllerFactory) -> Self {
        self.controllers = factory;
        self
    }

    /// Uses `verifier` instead of one built from the configuration.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Uses `template` for every sender.
    #[must_use]
    pub fn with_template(mut self, template: MessageTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Run id of this runner.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    fn context(&self) -> TestContext {
        let controller = (self.controllers)(&self.config);
        let mut ctx = TestContext::new(
            Arc::clone(&self.config),
            controller,
            Arc::clone(&self.reporter),
        )
        .with_run_id(self.run_id);
        if let Some(verifier) = &self.verifier {
            ctx = ctx.with_verifier(verifier.clone());
        }
        if let Some(template) = &self.template {
            ctx = ctx.with_template(template.clone());
        }
        ctx
    }

    /// Runs `cases` in the given order.
    pub async fn run(&self, cases: &[&TestCaseRegistration]) -> SuiteReport {
        let span = tracing::info_span!("suite", run_id = %self.run_id);
        self.run_inner(cases).instrument(span).await
    }

    async fn run_inner(&self, cases: &[&TestCaseRegistration]) -> SuiteReport {
        tracing::info!(cases = cases.len(), "starting suite");
        let mut report = SuiteReport {
            run_id: self.run_id,
            totals: TestSuiteResult::new(),
            cases: Vec::with_capacity(cases.len()),
            aborted: None,
        };

        for registration in cases {
            let mut case = registration.instantiate(self.config.verbose);
            let mut ctx = self.context();
            self.reporter.announce_banner(&format!(
                "Running tests from test_case: {}",
                registration.name
            ));

            match run_case(case.as_mut(), &mut ctx).await {
                Ok(result) => {
                    report.totals.absorb(&result);
                    report.cases.push(result);
                }
                Err(CaseAborted { partial, error }) => {
                    tracing::error!(case = registration.name, error = %error, "aborting run");
                    self.reporter.announce_banner(&format!(
                        "Aborted in test_case: {}: {error}",
                        registration.name
                    ));
                    report.totals.absorb(&partial);
                    report.cases.push(partial);
                    report.aborted = Some(format!("{}: {error}", registration.name));
                    break;
                }
            }
        }

        let totals = report.totals;
        self.reporter.announce_banner(&format!(
            "Results: all testcases:{}, success:{} failure:{}",
            totals.total(),
            totals.succeeded,
            totals.failed
        ));
        tracing::info!(
            succeeded = totals.succeeded,
            failed = totals.failed,
            aborted = report.aborted.is_some(),
            "suite finished"
        );
        report
    }
}
