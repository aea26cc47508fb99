//! # vmvault-testing
//!
//! Test doubles shared by the workspace's integration tests.
//!
//! - `FakeDaemon`: scripted `Transport` that records every request
//! - `responses`: canned daemon payloads
//! - `StubImageHost`: image host returning one fixed image
//! - `LogCapture`: collects formatted log lines for assertions

mod daemon;
mod host;
mod logs;
pub mod responses;

pub use daemon::{FakeDaemon, RecordedRequest};
pub use host::StubImageHost;
pub use logs::LogCapture;
