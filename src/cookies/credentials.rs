//! Session credential resolution.
//!
//! A session is a pair of opaque tokens: the session cookie and the
//! anti-forgery cookie that must be echoed in a header. They are taken from,
//! in order, explicit arguments, the environment, and the local browser
//! store. A source that yields only one half keeps it, and later sources only
//! fill in the missing half.

use crate::base::error::{Error, Result};
use crate::base::platform::Platform;
use crate::cookies::browser::{CookieQuery, CookieSource};
use std::fmt;
use tracing::debug;

/// Where the completed pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    CliArgs,
    Env,
    BrowserStore,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CredentialSource::CliArgs => "cli-args",
            CredentialSource::Env => "env",
            CredentialSource::BrowserStore => "chrome-cookie",
        })
    }
}

/// A resolved token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub session: String,
    pub csrf: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("session", &"<redacted>")
            .field("csrf", &"<redacted>")
            .finish()
    }
}

/// Possibly incomplete pair, filled source by source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCredential {
    pub session: Option<String>,
    pub csrf: Option<String>,
}

impl PartialCredential {
    pub fn new(session: Option<&str>, csrf: Option<&str>) -> Self {
        Self {
            session: non_empty(session),
            csrf: non_empty(csrf),
        }
    }

    fn fill(&mut self, session: Option<String>, csrf: Option<String>) {
        if self.session.is_none() {
            self.session = non_empty(session.as_deref());
        }
        if self.csrf.is_none() {
            self.csrf = non_empty(csrf.as_deref());
        }
    }

    fn complete(&self) -> Option<Credential> {
        match (&self.session, &self.csrf) {
            (Some(session), Some(csrf)) => Some(Credential {
                session: session.clone(),
                csrf: csrf.clone(),
            }),
            _ => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Names of the two tokens for one site.
#[derive(Debug, Clone)]
pub struct CredentialSpec {
    pub session_cookie: &'static str,
    pub csrf_cookie: &'static str,
    pub session_env: &'static [&'static str],
    pub csrf_env: &'static [&'static str],
    /// Cookie domains, most specific first.
    pub hosts: &'static [&'static str],
    pub remediation: &'static str,
}

impl CredentialSpec {
    /// X/Twitter web session.
    pub const fn twitter() -> Self {
        Self {
            session_cookie: "auth_token",
            csrf_cookie: "ct0",
            session_env: &["AUTH_TOKEN", "TWITTER_AUTH_TOKEN"],
            csrf_env: &["CT0", "TWITTER_CT0"],
            hosts: &["x.com", "twitter.com"],
            remediation: "provide --auth-token/--ct0 or log into x.com in Chrome",
        }
    }

    pub fn query(&self) -> CookieQuery {
        CookieQuery::for_hosts(self.hosts.iter().copied())
            .with_names([self.session_cookie, self.csrf_cookie])
    }
}

/// Runs the explicit > environment > browser-store chain.
pub struct CredentialResolver<'a, E> {
    spec: &'a CredentialSpec,
    platform: Platform,
    env: E,
}

impl<'a, E> CredentialResolver<'a, E>
where
    E: Fn(&str) -> Option<String>,
{
    pub fn new(spec: &'a CredentialSpec, platform: Platform, env: E) -> Self {
        Self {
            spec,
            platform,
            env,
        }
    }

    fn env_first(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .find_map(|name| non_empty((self.env)(name).as_deref()))
    }

    /// Resolve a complete pair or fail.
    ///
    /// The store is only consulted when the first two sources leave a half
    /// missing, and only on a platform that supports extraction.
    pub fn resolve(
        &self,
        explicit: PartialCredential,
        store: &dyn CookieSource,
    ) -> Result<(Credential, CredentialSource)> {
        let mut pair = explicit;
        if let Some(cred) = pair.complete() {
            return Ok((cred, CredentialSource::CliArgs));
        }

        pair.fill(
            self.env_first(self.spec.session_env),
            self.env_first(self.spec.csrf_env),
        );
        if let Some(cred) = pair.complete() {
            return Ok((cred, CredentialSource::Env));
        }

        if !self.platform.supports_store_extraction() {
            return Err(Error::PlatformNotSupported(format!(
                "missing {}/{} and browser cookie extraction is only supported on macOS (running on {})",
                self.spec.session_cookie,
                self.spec.csrf_cookie,
                self.platform.name()
            )));
        }

        let cookies = store.read_cookies(&self.spec.query())?;
        let lookup = |name: &str| {
            cookies
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.value.clone())
        };
        debug!(found = cookies.len(), "browser store lookup finished");
        pair.fill(
            lookup(self.spec.session_cookie),
            lookup(self.spec.csrf_cookie),
        );
        if let Some(cred) = pair.complete() {
            return Ok((cred, CredentialSource::BrowserStore));
        }

        Err(Error::credentials_unavailable(format!(
            "Unable to resolve {}/{}; {}",
            self.spec.session_cookie, self.spec.csrf_cookie, self.spec.remediation
        )))
    }
}

/// Environment lookup backed by the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
