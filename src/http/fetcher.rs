//! GET with a single challenge-page fallback.

use crate::base::error::{Error, Result};
use crate::http::curl::CurlTransport;
use crate::http::transport::{HyperTransport, Transport};
use crate::urlrequest::context::FetchConfig;
use crate::urlrequest::request::FetchRequest;
use serde_json::Value;
use tracing::{info, warn};

/// Markers of a Cloudflare interstitial. A heuristic: keep the list here
/// and nowhere else.
pub const CHALLENGE_FINGERPRINTS: &[&str] = &[
    "__cf_chl_opt",
    "__CF$cv$params",
    "Just a moment...",
    "Enable JavaScript and cookies to continue",
];

pub fn is_challenge(text: &str) -> bool {
    CHALLENGE_FINGERPRINTS.iter().any(|f| text.contains(f))
}

/// Primary transport plus an optional fallback tried once, only when the
/// primary hits an anti-bot challenge.
pub struct Fetcher {
    primary: Box<dyn Transport>,
    fallback: Option<Box<dyn Transport>>,
}

impl Fetcher {
    pub fn new(primary: Box<dyn Transport>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn Transport>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// In-process transport only.
    pub fn direct(config: &FetchConfig) -> Self {
        Self::new(Box::new(HyperTransport::new(config.clone())))
    }

    /// In-process transport with `curl` as the challenge fallback.
    pub fn with_curl_fallback(config: &FetchConfig) -> Self {
        Self::direct(config).with_fallback(Box::new(CurlTransport::new(config.clone())))
    }

    pub async fn fetch_text(&self, request: &FetchRequest) -> Result<String> {
        let Some(fallback) = &self.fallback else {
            return self.primary.get(request).await;
        };

        let primary_failure = match self.primary.get(request).await {
            Ok(body) if !is_challenge(&body) => return Ok(body),
            Ok(_) => format!("{} hit an anti-bot challenge page", self.primary.name()),
            Err(Error::HttpStatus {
                status, snippet, ..
            }) if is_challenge(&snippet) => format!(
                "{} hit an anti-bot challenge page (HTTP {status})",
                self.primary.name()
            ),
            Err(e) => return Err(e),
        };

        warn!(url = %request.url, "{primary_failure}; retrying with {}", fallback.name());
        match fallback.get(request).await {
            Ok(body) if !is_challenge(&body) => {
                info!(transport = fallback.name(), "fallback request succeeded");
                Ok(body)
            }
            Ok(_) => Err(Error::Blocked {
                primary: primary_failure,
                fallback: format!("{} also hit an anti-bot challenge page", fallback.name()),
            }),
            Err(e) => Err(Error::Blocked {
                primary: primary_failure,
                fallback: format!("{}: {e}", fallback.name()),
            }),
        }
    }

    /// Fetch and parse as JSON.
    pub async fn fetch_json(&self, request: &FetchRequest) -> Result<Value> {
        let text = self.fetch_text(request).await?;
        serde_json::from_str(&text).map_err(|e| Error::json_parse(e, &text))
    }
}
