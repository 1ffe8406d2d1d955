// Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # logprobe-transport
//!
//! Senders that emit bursts of numbered messages to the daemon under test.
//!
//! Supported channels:
//! - **Unix sockets**: stream and datagram
//! - **Inet**: TCP and UDP
//! - **Named pipes**: line framed
//! - **Files**: appended lines for file-following sources
//!
//! ## Example
//!
//! ```rust,ignore
//! use logprobe_core::{ExpectedSet, SessionCounter};
//! use logprobe_transport::{MessageSender, Transport};
//!
//! let counter = SessionCounter::new();
//! let sender = MessageSender::new(Transport::unix_stream("log-stream"), counter)
//!     .with_repeat(10);
//!
//! let mut expected = ExpectedSet::new();
//! expected.extend(sender.send_messages("kakukk").await?);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod sender;
pub mod transport;

pub use error::{Result, TransportError};
pub use sender::MessageSender;
pub use transport::{Framing, Transport};
