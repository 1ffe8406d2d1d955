//! End-to-end runs against the fake daemon.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod cases;
mod correlation;
mod fake_daemon;
mod suite;
