//! Per test case execution context.
//!
//! A context is created fresh for every test case. It owns the case's
//! identity allocator, so session numbers never leak between cases, and the
//! process controller that brings the daemon up and down around each test
//! function.

use std::path::PathBuf;
use std::sync::Arc;

use logprobe_control::ProcessController;
use logprobe_core::{
    HarnessConfig, MessageTemplate, Reporter, SessionCounter, TestCaseDescriptor, render_template,
};
use logprobe_transport::{MessageSender, Transport};
use logprobe_verify::Verifier;
use uuid::Uuid;

use crate::error::Result;

/// Everything a test function needs to drive the daemon.
pub struct TestContext {
    config: Arc<HarnessConfig>,
    counter: SessionCounter,
    template: MessageTemplate,
    verifier: Verifier,
    controller: Box<dyn ProcessController>,
    reporter: Arc<dyn Reporter>,
    run_id: Uuid,
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("run_id", &self.run_id)
            .field("session", &self.counter.peek())
            .field("daemon_running", &self.controller.is_running())
            .finish_non_exhaustive()
    }
}

impl TestContext {
    /// Creates a context with a fresh session counter.
    #[must_use]
    pub fn new(
        config: Arc<HarnessConfig>,
        controller: Box<dyn ProcessController>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let verifier = Verifier::from_config(&config);
        Self {
            config,
            counter: SessionCounter::new(),
            template: MessageTemplate::default(),
            verifier,
            controller,
            reporter,
            run_id: Uuid::nil(),
        }
    }

    /// Replaces the verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Replaces the template used by senders created from this context.
    #[must_use]
    pub fn with_template(mut self, template: MessageTemplate) -> Self {
        self.template = template;
        self
    }

    /// Tags the context with the suite run id.
    #[must_use]
    pub const fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Harness configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Verbosity flag the case was instantiated with.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.config.verbose
    }

    /// The case's identity allocator.
    #[must_use]
    pub const fn counter(&self) -> &SessionCounter {
        &self.counter
    }

    /// Verification engine.
    #[must_use]
    pub const fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// Reporter for progress output.
    #[must_use]
    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter.as_ref()
    }

    /// Suite run id.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Process controller.
    #[must_use]
    pub fn controller(&self) -> &dyn ProcessController {
        self.controller.as_ref()
    }

    /// Path of a daemon artifact (socket, pipe, output file).
    #[must_use]
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.verifier.artifact(name)
    }

    /// A sender sharing this context's session counter.
    ///
    /// Relative paths in `transport` resolve inside the daemon's working
    /// directory.
    #[must_use]
    pub fn sender(&self, transport: Transport) -> MessageSender {
        MessageSender::new(transport, self.counter.clone())
            .with_template(self.template.clone())
            .with_base_dir(self.config.daemon.working_dir.clone())
    }

    /// Substitutes `@name@` placeholders in a configuration body.
    ///
    /// # Errors
    /// Returns an error if the body names an unknown placeholder.
    pub fn render_config(&self, body: &str) -> Result<String> {
        Ok(render_template(body, &self.config.template_context())?)
    }

    /// Renders the descriptor's configuration and starts the daemon.
    ///
    /// # Errors
    /// Returns a fatal controller error if the daemon does not start.
    pub async fn start_daemon(&mut self, descriptor: &TestCaseDescriptor) -> Result<()> {
        let config = self.render_config(&descriptor.config)?;
        let verbose = self.verbose();
        self.controller
            .start(&config, verbose, descriptor.dialect)
            .await?;
        Ok(())
    }

    /// Stops the daemon.
    ///
    /// # Errors
    /// Returns a fatal controller error if the daemon does not stop.
    pub async fn stop_daemon(&mut self) -> Result<()> {
        self.controller.stop().await?;
        Ok(())
    }
}
