//! Base types and error handling.
//!
//! - [`error`]: the crate-wide [`Error`](error::Error) enum and exit codes
//! - [`context`]: `io::Error` context helpers
//! - [`logging`]: the stderr `tracing` subscriber
//! - [`platform`]: host OS detection for browser-store features
//! - [`runtime`]: the async runtime, blocking offload and Ctrl-C

pub mod context;
pub mod error;
pub mod logging;
pub mod platform;
pub mod runtime;

pub use error::{Error, ErrorKind, Result};
