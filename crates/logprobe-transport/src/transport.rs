//! Transport descriptions.
//!
//! The [`fmt::Display`] form of a transport (`unix-stream(log-stream)`,
//! `tcp(localhost:2000)`, ...) is embedded in every message body, so the
//! daemon's output also records which channel delivered a message.

use std::fmt;
use std::path::PathBuf;

/// How messages are framed on a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Newline terminated lines on a byte stream.
    Line,
    /// One message per datagram, no terminator.
    Datagram,
}

/// A channel the daemon under test listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Unix domain stream socket.
    UnixStream(PathBuf),
    /// Unix domain datagram socket.
    UnixDgram(PathBuf),
    /// TCP connection.
    Tcp {
        /// Host name or address.
        host: String,
        /// Port.
        port: u16,
    },
    /// UDP datagrams.
    Udp {
        /// Host name or address.
        host: String,
        /// Port.
        port: u16,
    },
    /// Named pipe (FIFO).
    Pipe(PathBuf),
    /// Plain file the daemon follows.
    File(PathBuf),
}

impl Transport {
    /// Unix stream socket at `path`.
    #[must_use]
    pub fn unix_stream(path: impl Into<PathBuf>) -> Self {
        Self::UnixStream(path.into())
    }

    /// Unix datagram socket at `path`.
    #[must_use]
    pub fn unix_dgram(path: impl Into<PathBuf>) -> Self {
        Self::UnixDgram(path.into())
    }

    /// TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// UDP endpoint.
    #[must_use]
    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self::Udp {
            host: host.into(),
            port,
        }
    }

    /// Named pipe.
    #[must_use]
    pub fn pipe(path: impl Into<PathBuf>) -> Self {
        Self::Pipe(path.into())
    }

    /// Plain file.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Framing used on this transport.
    #[must_use]
    pub const fn framing(&self) -> Framing {
        match self {
            Self::UnixDgram(_) | Self::Udp { .. } => Framing::Datagram,
            _ => Framing::Line,
        }
    }

    /// Returns true for datagram transports.
    #[must_use]
    pub const fn is_datagram(&self) -> bool {
        matches!(self.framing(), Framing::Datagram)
    }

    /// Encodes one rendered wire line for this transport.
    #[must_use]
    pub fn frame(&self, wire: &str) -> Vec<u8> {
        match self.framing() {
            Framing::Datagram => wire.as_bytes().to_vec(),
            Framing::Line => {
                let mut buf = Vec::with_capacity(wire.len() + 1);
                buf.extend_from_slice(wire.as_bytes());
                buf.push(b'\n');
                buf
            }
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnixStream(path) => write!(f, "unix-stream({})", path.display()),
            Self::UnixDgram(path) => write!(f, "unix-dgram({})", path.display()),
            Self::Tcp { host, port } => write!(f, "tcp({host}:{port})"),
            Self::Udp { host, port } => write!(f, "udp({host}:{port})"),
            Self::Pipe(path) => write!(f, "pipe({})", path.display()),
            Self::File(path) => write!(f, "file({})", path.display()),
        }
    }
}
