//! Request description and per-invocation fetch settings.

pub mod context;
pub mod request;

pub use context::FetchConfig;
pub use request::{parse_param_overrides, FetchRequest, QueryParams};
