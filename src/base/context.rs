//! Ergonomic error context helpers.
//!
//! Extension traits that turn bare `io::Error`s into context-rich
//! [`Error`] variants naming the host or file involved.

use crate::base::error::Error;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use sessiontap::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("x.com", 443)?;
    /// // Error: "Connection to x.com:443 failed: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, Error>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, Error>;

    /// Add the path of the file being read or written.
    fn path_context(self, path: &Path) -> Result<T, Error>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, Error> {
        self.map_err(|e| Error::connection_failed_to(host, port, e))
    }

    fn dns_context(self, domain: &str) -> Result<T, Error> {
        self.map_err(|e| Error::dns_failed(domain, e))
    }

    fn path_context(self, path: &Path) -> Result<T, Error> {
        self.map_err(|e| Error::io(path, e))
    }
}
