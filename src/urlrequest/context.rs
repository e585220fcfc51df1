//! Fetch configuration.
//!
//! Based on Chromium's net::URLRequestContext: one place holding the
//! settings every request of an invocation shares. Resolved once during
//! command setup and passed explicitly to the transports.

use crate::socket::proxy::ProxySettings;
use std::time::Duration;

/// Chrome user agent used when a command does not pick its own.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Configuration shared by the transports of one invocation.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Bounds connect, request and body read together.
    pub timeout: Duration,

    /// Proxy settings (None for direct connections).
    pub proxy: Option<ProxySettings>,

    /// User-Agent for transports that set it outside the header list.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            proxy: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    /// Defaults plus the proxy from the environment.
    pub fn from_env() -> Self {
        Self::default().with_proxy(ProxySettings::from_env())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    pub fn with_proxy(mut self, proxy: Option<ProxySettings>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_setters() {
        let config = FetchConfig::default()
            .with_timeout_secs(20)
            .with_user_agent("ua/1.0")
            .with_proxy(ProxySettings::new("127.0.0.1:8080").ok());
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.user_agent, "ua/1.0");
        assert_eq!(
            config.proxy.and_then(|p| p.host_port().map(|(h, p)| (h.to_string(), p))),
            Some(("127.0.0.1".to_string(), 8080))
        );
    }
}
