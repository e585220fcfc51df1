use std::io;
use std::path::Path;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse grouping of [`Error`] variants, used for exit codes and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Credentials,
    Platform,
    CookieStore,
    Input,
    Network,
    HttpStatus,
    Decode,
    Io,
    Interrupted,
}

#[derive(Debug, Error)]
pub enum Error {
    // Credential errors
    #[error("{message}")]
    CredentialsUnavailable { message: String },
    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    // Cookie store errors
    #[error("Cookie database not found: {path}")]
    CookieDbNotFound { path: String },
    #[error("Cannot read the browser safe-storage password from the keychain (tried {services})")]
    KeyringUnavailable { services: String },
    #[error("Cookie decryption failed: {reason}")]
    CookieDecryptionFailed { reason: String },
    #[error("Cookie database error: {message}")]
    CookieDatabase { message: String },
    #[error("Cookie database is locked")]
    CookieDatabaseLocked,

    // Input errors
    #[error("Invalid argument: {0}")]
    InvalidInput(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Transport errors
    #[error("Network error while requesting {url}: {reason}")]
    Network { url: String, reason: String },
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("Name not resolved: {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: io::Error,
    },
    #[error("TLS error with {host}: {reason}")]
    Tls { host: String, reason: String },
    #[error("Too many redirects starting from {url}")]
    TooManyRedirects { url: String },
    #[error("HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: u16,
        url: String,
        snippet: String,
    },
    #[error("Request blocked by an anti-bot challenge.\n  primary: {primary}\n  fallback: {fallback}\nConfigure a proxy or provide a cookie and retry.")]
    Blocked { primary: String, fallback: String },

    // Decode errors
    #[error("Invalid JSON response: {reason}\n{prefix}")]
    JsonParse { reason: String, prefix: String },
    #[error("Unexpected response structure: {0}")]
    UnexpectedShape(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Interrupted by user")]
    Interrupted,
}

impl Error {
    pub fn credentials_unavailable(message: impl Into<String>) -> Self {
        Self::CredentialsUnavailable {
            message: message.into(),
        }
    }

    pub fn cookie_db_not_found(path: impl AsRef<Path>) -> Self {
        Self::CookieDbNotFound {
            path: path.as_ref().display().to_string(),
        }
    }

    pub fn cookie_decryption_failed(reason: impl Into<String>) -> Self {
        Self::CookieDecryptionFailed {
            reason: reason.into(),
        }
    }

    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        Self::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source,
        }
    }

    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        Self::NameNotResolvedFor {
            domain: domain.to_string(),
            source,
        }
    }

    pub fn tls(host: &str, reason: impl ToString) -> Self {
        Self::Tls {
            host: host.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn json_parse(reason: impl ToString, body: &str) -> Self {
        Self::JsonParse {
            reason: reason.to_string(),
            prefix: body.chars().take(300).collect(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CredentialsUnavailable { .. } => ErrorKind::Credentials,
            Error::PlatformNotSupported(_) => ErrorKind::Platform,
            Error::CookieDbNotFound { .. }
            | Error::KeyringUnavailable { .. }
            | Error::CookieDecryptionFailed { .. }
            | Error::CookieDatabase { .. }
            | Error::CookieDatabaseLocked => ErrorKind::CookieStore,
            Error::InvalidInput(_) | Error::InvalidUrl(_) => ErrorKind::Input,
            Error::Network { .. }
            | Error::ConnectionFailedTo { .. }
            | Error::NameNotResolvedFor { .. }
            | Error::Tls { .. }
            | Error::TooManyRedirects { .. }
            | Error::Blocked { .. } => ErrorKind::Network,
            Error::HttpStatus { .. } => ErrorKind::HttpStatus,
            Error::JsonParse { .. } | Error::UnexpectedShape(_) => ErrorKind::Decode,
            Error::Io { .. } => ErrorKind::Io,
            Error::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Interrupted => 130,
            ErrorKind::Input => 2,
            _ => 1,
        }
    }

    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ffi::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ffi::ErrorCode::DatabaseLocked =>
            {
                Error::CookieDatabaseLocked
            }
            _ => Error::CookieDatabase {
                message: err.to_string(),
            },
        }
    }
}
