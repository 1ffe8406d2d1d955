//! Input drivers of a Lua configured daemon.
//!
//! Every source feeds one filtered file destination; each test function sends
//! through one driver and expects exactly its own messages in the file.
//! TLS, syslog protocol, network() and the padded pipe are configured but not
//! driven.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use logprobe_core::{Dialect, ExpectedSet, Outcome, TestCaseDescriptor};
use logprobe_harness::{HarnessError, Result, TestCase, TestContext};
use logprobe_transport::Transport;

const CONFIG: &str = r#"
Options{ ts_format = "iso", chain_hostnames = false, keep_hostname = true, threaded = true }

Source( "s_int", { Internal() })
Source( "s_unix", { UnixStreamSource("log-stream", { flags = { "expect-hostname" } }), UnixDgramSource("log-dgram", { flags = { "expect-hostname" } }) })
Source( "s_inet", { TcpSource{ port = @port_number@ }, UdpSource{ port = @port_number@, so_recvbuf = 131072 } })
Source( "s_inetssl", { TcpSource{ port = @ssl_port_number@, tls = { peer_verify = "none", cert_file = "@src_dir@/ssl.crt", key_file = "@src_dir@/ssl.key" } } })
Source( "s_pipe", { PipeSource("log-pipe", { flags = { "expect-hostname"} }), PipeSource("log-padded-pipe", { flags = { "expect-hostname"}, pad_size = 2048 }) } )
Source( "s_file", { FileSource("log-file") })
Source( "s_network", { NetworkSource{ transport = "udp", port = @port_number_network@ }, NetworkSource{ transport = "tcp", port = @port_number_network@ } })

Source( "s_syslog", { SyslogSource{ port = @port_number_syslog@, transport = "tcp", so_rcvbuf = 131072 }, SyslogSource{ port = @port_number_syslog@, transport = "udp", so_rcvbuf = 131072 } })

Filter( "f_input1", MessageFilter("input_drivers"))

Destination( "d_input1", { FileDestination("test-input1.log") } )
Destination( "d_input1_new", { FileDestination("test-input1_new.log", { flags = {"syslog-protocol"} } ) } )

Log {
  Source("s_int"), Source("s_unix"), Source("s_inet"), Source("s_inetssl"), Source("s_pipe"), Source("s_file"), Source("s_network"),
  EmbeddedLog{
     Filter("f_input1"),
     Destination("d_input1")
  }
}

Log {
  Source("s_syslog"),
  EmbeddedLog{
     Filter("f_input1"),
     Destination("d_input1_new")
  }
}
"#;

/// File every driver's messages end up in.
pub const OUTPUT: &str = "test-input1.log";

/// Payload matched by the configuration's message filter.
pub const PAYLOAD: &str = "input_drivers";

/// File followed by the file source. Appended to, so removed with the output.
pub const INPUT_FILE: &str = "log-file";

const LOOPBACK: &str = "127.0.0.1";
const BURST: u32 = 10;

/// One burst per input driver, checked against the shared output file.
#[derive(Debug)]
pub struct TestInputDrivers {
    descriptor: TestCaseDescriptor,
}

impl TestInputDrivers {
    /// Creates the case.
    #[must_use]
    pub fn new(_verbose: bool) -> Self {
        Self {
            descriptor: TestCaseDescriptor::new("TestInputDrivers", CONFIG, Dialect::Lua),
        }
    }

    /// Transport driven by the test function `name`.
    #[must_use]
    pub fn transport(name: &str, port: u16) -> Option<Transport> {
        let transport = match name {
            "test_input_unix_stream" => Transport::unix_stream("log-stream"),
            "test_input_unix_dgram" => Transport::unix_dgram("log-dgram"),
            "test_input_tcp" => Transport::tcp(LOOPBACK, port),
            "test_input_udp" => Transport::udp(LOOPBACK, port),
            "test_input_pipe" => Transport::pipe("log-pipe"),
            "test_input_file" => Transport::file(INPUT_FILE),
            _ => return None,
        };
        Some(transport)
    }
}

logprobe_harness::register_test_case!(TestInputDrivers);

#[async_trait]
impl TestCase for TestInputDrivers {
    fn descriptor(&self) -> &TestCaseDescriptor {
        &self.descriptor
    }

    fn test_functions(&self) -> &'static [&'static str] {
        &[
            "test_input_unix_stream",
            "test_input_unix_dgram",
            "test_input_tcp",
            "test_input_udp",
            "test_input_pipe",
            "test_input_file",
        ]
    }

    fn check_runnable(&self, _ctx: &TestContext) -> bool {
        cfg!(unix)
    }

    /// Output and input files outlive daemon restarts; start each function
    /// clean.
    async fn set_up(&mut self, ctx: &mut TestContext) -> Result<()> {
        remove_stale(&ctx.artifact(OUTPUT)).await?;
        remove_stale(&ctx.artifact(INPUT_FILE)).await?;
        ctx.start_daemon(&self.descriptor).await
    }

    async fn run_test(&mut self, name: &str, ctx: &mut TestContext) -> Result<Outcome> {
        let transport = Self::transport(name, ctx.config().ports.port_number)
            .ok_or_else(|| HarnessError::unknown_test(&self.descriptor.name, name))?;
        let sent = ctx
            .sender(transport)
            .with_repeat(BURST)
            .send_messages(PAYLOAD)
            .await?;
        let expected: ExpectedSet = sent.into_iter().collect();
        Ok(ctx.verifier().file_exact(OUTPUT, &expected, None).await?)
    }
}

async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
