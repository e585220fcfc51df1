//! HTTP request execution.
//!
//! - [`orderedheaders`]: insertion-ordered header map
//! - [`transport`]: the [`Transport`] seam and the in-process hyper transport
//! - [`curl`]: external-process fallback transport
//! - [`fetcher`]: primary/fallback orchestration and JSON decoding
//! - [`response`]: bounded body reads

pub mod curl;
pub mod fetcher;
pub mod orderedheaders;
pub mod response;
pub mod transport;

pub use fetcher::Fetcher;
pub use orderedheaders::OrderedHeaderMap;
pub use transport::{HyperTransport, Transport};
