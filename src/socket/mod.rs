//! Socket and connection setup.
//!
//! Mirrors the parts of Chromium's `net/socket/` a one-shot client needs:
//! - [`connectjob`]: DNS → TCP → CONNECT tunnel → TLS connection flow
//! - [`proxy`]: HTTP proxy settings from the environment
//! - [`tls`]: TLS configuration with BoringSSL
//! - [`client`]: the connected socket type

pub mod client;
pub mod connectjob;
pub mod proxy;
pub mod tls;
