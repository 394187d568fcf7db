//! # integration-tests
//!
//! End-to-end fixtures: a stateful fake of the marketplace backend and a
//! harness that drives the real controller against it over HTTP.

pub mod backend;
pub mod harness;

pub use backend::{FakeMarket, Recorded, PASSWORD};
pub use harness::{eventually, page, Harness, RecordingNotifier, ScriptedDialogs};
