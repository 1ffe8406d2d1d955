//! End-to-end runs of the harness against an in-process fake daemon.
//!
//! Each test drives the full lifecycle (discovery registration, controller,
//! senders, verification) and checks one observable law of a run.

mod end_to_end_tests;
