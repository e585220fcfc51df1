//! Defensive access to untyped JSON responses.

pub mod access;

pub use access::ValueExt;
