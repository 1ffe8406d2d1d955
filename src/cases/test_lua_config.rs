//! The daemon accepts a Lua configuration and delivers through it.

use async_trait::async_trait;
use logprobe_core::{Dialect, ExpectedSet, Outcome, TestCaseDescriptor};
use logprobe_harness::{Result, TestCase, TestContext};
use logprobe_transport::Transport;

const CONFIG: &str = r#"
Options{
  threaded = True,
  ts_format = "iso",
  keep_hostname = False,
}
Source("s_test", {
    UnixStreamSource("test-lua-log", { host_override = "bzorp", } )
})
Destination("d_test", { FileDestination("test-lua.log") })
Log {
   Source("s_test"),
   Destination("d_test")
}
"#;

/// Socket the Lua configuration listens on.
pub const SOCKET: &str = "test-lua-log";

/// File the Lua configuration writes to.
pub const OUTPUT: &str = "test-lua.log";

/// Hostname the source stamps on every message.
pub const HOST_OVERRIDE: &str = "bzorp";

/// Ten messages through a Lua configured unix stream source.
#[derive(Debug)]
pub struct TestLuaConfig {
    descriptor: TestCaseDescriptor,
}

impl TestLuaConfig {
    /// Creates the case.
    #[must_use]
    pub fn new(_verbose: bool) -> Self {
        Self {
            descriptor: TestCaseDescriptor::new("TestLuaConfig", CONFIG, Dialect::Lua),
        }
    }
}

logprobe_harness::register_test_case!(TestLuaConfig);

#[async_trait]
impl TestCase for TestLuaConfig {
    fn descriptor(&self) -> &TestCaseDescriptor {
        &self.descriptor
    }

    fn test_functions(&self) -> &'static [&'static str] {
        &["test_lua_config"]
    }

    fn check_runnable(&self, _ctx: &TestContext) -> bool {
        cfg!(unix)
    }

    async fn run_test(&mut self, _name: &str, ctx: &mut TestContext) -> Result<Outcome> {
        let sent = ctx
            .sender(Transport::unix_stream(SOCKET))
            .with_repeat(10)
            .send_messages("kakukk")
            .await?;
        let expected: ExpectedSet = sent.into_iter().collect();
        Ok(ctx
            .verifier()
            .file_exact(OUTPUT, &expected, Some(HOST_OVERRIDE))
            .await?)
    }
}
