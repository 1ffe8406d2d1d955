//! In-process stand-in for the log daemon.
//!
//! Listens on a unix stream socket inside a temporary working directory,
//! appends every received line to an output file and keeps the newest
//! [`FEED_BACKLOG`] messages in a feed served over TCP. Starting it through
//! [`FakeController`] resets the output file and the feed ids, the way a
//! restarted daemon would.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use logprobe_control::{ControlError, ProcessController};
use logprobe_core::config::VerifySection;
use logprobe_core::{Dialect, HarnessConfig};
use logprobe_verify::{FEED_BACKLOG, FEED_TITLE, FeedClient, FeedDocument, Verifier};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, UnixListener};
use tokio::task::JoinHandle;

/// Socket the fake daemon reads messages from.
pub const INGRESS_SOCKET: &str = "log-stream";

/// File the fake daemon writes every message to.
pub const OUTPUT_FILE: &str = "test-output.log";

struct Sink {
    output: PathBuf,
    link: String,
    backlog: VecDeque<(String, u64)>,
    next_id: u64,
}

impl Sink {
    fn reset(&mut self) {
        self.backlog.clear();
        self.next_id = 0;
        let _ = std::fs::remove_file(&self.output);
    }

    fn ingest(&mut self, wire: &str) -> std::io::Result<()> {
        // strip the <pri> header; the rest is what a file destination writes
        let line = wire.split_once('>').map_or(wire, |(_, rest)| rest);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output)?;
        writeln!(file, "{line}")?;

        let message = line.split_once("]: ").map_or(line, |(_, m)| m);
        if self.backlog.len() as u64 == FEED_BACKLOG {
            self.backlog.pop_front();
        }
        self.backlog.push_back((message.to_string(), self.next_id));
        self.next_id += 1;
        Ok(())
    }

    fn feed(&self) -> FeedDocument {
        let mut doc = FeedDocument::new(FEED_TITLE, self.link.as_str());
        for (message, id) in &self.backlog {
            doc.push(message.as_str(), *id);
        }
        doc
    }
}

/// A running fake daemon.
pub struct FakeDaemon {
    dir: TempDir,
    feed_port: u16,
    sink: Arc<Mutex<Sink>>,
    tasks: Vec<JoinHandle<()>>,
}

impl FakeDaemon {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let ingress = UnixListener::bind(dir.path().join(INGRESS_SOCKET)).unwrap();
        let feed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let feed_port = feed.local_addr().unwrap().port();

        let sink = Arc::new(Mutex::new(Sink {
            output: dir.path().join(OUTPUT_FILE),
            link: format!("localhost:{feed_port}"),
            backlog: VecDeque::new(),
            next_id: 0,
        }));

        let ingress_sink = Arc::clone(&sink);
        let ingress_task = tokio::spawn(async move {
            while let Ok((stream, _)) = ingress.accept().await {
                let sink = Arc::clone(&ingress_sink);
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stream).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        sink.lock().ingest(&line).unwrap();
                    }
                });
            }
        });

        let feed_sink = Arc::clone(&sink);
        let feed_task = tokio::spawn(async move {
            while let Ok((mut stream, _)) = feed.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 64];
                while !request.ends_with(b"\n\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let body = feed_sink.lock().feed().render();
                let _ = stream.write_all(body.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            dir,
            feed_port,
            sink,
            tasks: vec![ingress_task, feed_task],
        }
    }

    /// Working directory holding the socket and the output file.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Harness configuration pointing at this daemon, with a verification
    /// budget of `timeout`.
    pub fn config(&self, timeout: Duration) -> HarnessConfig {
        let mut config = HarnessConfig::default();
        config.daemon.working_dir = self.dir().to_path_buf();
        config.ports.feed_port = self.feed_port;
        config.verify = VerifySection {
            settle_delay: Duration::ZERO,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            multiplier: 2.0,
            timeout,
        };
        config
    }

    /// Verifier for `config` that reaches the feed over IPv4.
    pub fn verifier(&self, config: &HarnessConfig) -> Verifier {
        Verifier::from_config(config).with_feed(self.feed_client())
    }

    pub fn feed_client(&self) -> FeedClient {
        FeedClient::new("127.0.0.1", self.feed_port)
    }

    pub fn controller(&self) -> FakeController {
        FakeController {
            sink: Arc::clone(&self.sink),
            configs: Arc::new(Mutex::new(Vec::new())),
            running: false,
        }
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Controller that "restarts" the fake daemon by resetting its state.
#[derive(Clone)]
pub struct FakeController {
    sink: Arc<Mutex<Sink>>,
    configs: Arc<Mutex<Vec<String>>>,
    running: bool,
}

impl FakeController {
    /// Configuration bodies passed to every start, in order.
    pub fn configs(&self) -> Vec<String> {
        self.configs.lock().clone()
    }
}

#[async_trait]
impl ProcessController for FakeController {
    async fn start(
        &mut self,
        config: &str,
        _verbose: bool,
        _dialect: Dialect,
    ) -> logprobe_control::Result<()> {
        if self.running {
            return Err(ControlError::AlreadyRunning(0));
        }
        self.sink.lock().reset();
        self.configs.lock().push(config.to_string());
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) -> logprobe_control::Result<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
