//! Numbered message sender.
//!
//! A sender owns a transport, a repeat count and a handle to the case's
//! [`SessionCounter`]. Each call to [`MessageSender::send_messages`] draws one
//! session, renders `repeat` messages numbered `1..=repeat`, transmits them in
//! order and hands the rendered messages back for the expected set.

use std::path::{Path, PathBuf};

use logprobe_core::{MessageTemplate, RenderedMessage, SessionCounter};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};
use crate::transport::Transport;

/// Emits bursts of numbered messages over one transport.
#[derive(Debug, Clone)]
pub struct MessageSender {
    transport: Transport,
    repeat: u32,
    counter: SessionCounter,
    template: MessageTemplate,
    base_dir: Option<PathBuf>,
}

impl MessageSender {
    /// Creates a sender emitting one message per burst.
    #[must_use]
    pub fn new(transport: Transport, counter: SessionCounter) -> Self {
        Self {
            transport,
            repeat: 1,
            counter,
            template: MessageTemplate::default(),
            base_dir: None,
        }
    }

    /// Sets the number of messages per burst.
    #[must_use]
    pub const fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }

    /// Replaces the message template.
    #[must_use]
    pub fn with_template(mut self, template: MessageTemplate) -> Self {
        self.template = template;
        self
    }

    /// Resolves relative socket, pipe and file paths against `dir`.
    ///
    /// The channel label embedded in messages keeps the path as given.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir
            .as_ref()
            .map_or_else(|| path.to_path_buf(), |base| base.join(path))
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the repeat count.
    #[must_use]
    pub const fn repeat(&self) -> u32 {
        self.repeat
    }

    /// Renders and transmits one burst, returning the messages in send order.
    ///
    /// # Errors
    /// Returns an error if the channel cannot be opened or a write fails. The
    /// session is consumed even when sending fails.
    pub async fn send_messages(&self, payload: &str) -> Result<Vec<RenderedMessage>> {
        let channel = self.transport.to_string();
        let burst = self.counter.begin_burst(self.repeat);
        let session = burst.session();
        let messages = self.template.render_burst(payload, burst, &channel);

        let frames = messages
            .iter()
            .map(|m| (m.identity.sequence(), self.transport.frame(&m.wire())))
            .collect::<Vec<_>>();

        self.transmit(&channel, &frames).await?;

        tracing::debug!(
            channel = %channel,
            session = session,
            count = messages.len(),
            "sent burst"
        );
        Ok(messages)
    }

    async fn transmit(&self, channel: &str, frames: &[(u32, Vec<u8>)]) -> Result<()> {
        match &self.transport {
            #[cfg(unix)]
            Transport::UnixStream(path) => {
                let stream = tokio::net::UnixStream::connect(self.resolve(path))
                    .await
                    .map_err(|e| TransportError::connect(channel, e))?;
                write_stream(stream, channel, frames).await
            }
            #[cfg(unix)]
            Transport::UnixDgram(path) => {
                let target = self.resolve(path);
                let socket = tokio::net::UnixDatagram::unbound()
                    .map_err(|e| TransportError::connect(channel, e))?;
                for (sequence, frame) in frames {
                    socket
                        .send_to(frame, &target)
                        .await
                        .map_err(|e| TransportError::send(channel, *sequence, e))?;
                }
                Ok(())
            }
            #[cfg(not(unix))]
            Transport::UnixStream(_) | Transport::UnixDgram(_) => {
                Err(TransportError::NotSupported(channel.to_string()))
            }
            Transport::Tcp { host, port } => {
                let stream = tokio::net::TcpStream::connect((host.as_str(), *port))
                    .await
                    .map_err(|e| TransportError::connect(channel, e))?;
                write_stream(stream, channel, frames).await
            }
            Transport::Udp { host, port } => {
                let target = tokio::net::lookup_host((host.as_str(), *port))
                    .await
                    .map_err(|e| TransportError::connect(channel, e))?
                    .next()
                    .ok_or_else(|| {
                        TransportError::connect(
                            channel,
                            std::io::Error::new(
                                std::io::ErrorKind::NotFound,
                                format!("{host} did not resolve"),
                            ),
                        )
                    })?;
                let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
                let socket = tokio::net::UdpSocket::bind(local)
                    .await
                    .map_err(|e| TransportError::connect(channel, e))?;
                for (sequence, frame) in frames {
                    socket
                        .send_to(frame, target)
                        .await
                        .map_err(|e| TransportError::send(channel, *sequence, e))?;
                }
                Ok(())
            }
            Transport::Pipe(path) => {
                // Opening a FIFO for writing waits until the daemon has it open.
                let file = tokio::fs::OpenOptions::new()
                    .write(true)
                    .open(self.resolve(path))
                    .await
                    .map_err(|e| TransportError::connect(channel, e))?;
                write_stream(file, channel, frames).await
            }
            Transport::File(path) => {
                let file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.resolve(path))
                    .await
                    .map_err(|e| TransportError::connect(channel, e))?;
                write_stream(file, channel, frames).await
            }
        }
    }
}

async fn write_stream<W>(mut writer: W, channel: &str, frames: &[(u32, Vec<u8>)]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut last = 0;
    for (sequence, frame) in frames {
        last = *sequence;
        writer
            .write_all(frame)
            .await
            .map_err(|e| TransportError::send(channel, *sequence, e))?;
    }
    writer
        .flush()
        .await
        .map_err(|e| TransportError::send(channel, last, e))?;
    writer
        .shutdown()
        .await
        .map_err(|e| TransportError::send(channel, last, e))?;
    Ok(())
}
