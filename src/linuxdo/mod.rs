//! Read-only linux.do (Discourse) client.

pub mod client;
pub mod commands;
pub mod cookie;
pub mod format;
pub mod ua;

pub use client::LinuxDoClient;
pub use commands::{ListOptions, Period, TopicOptions};

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
