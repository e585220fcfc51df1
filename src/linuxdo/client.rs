use crate::base::error::{Error, Result};
use crate::http::fetcher::Fetcher;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::linuxdo::format::BASE_URL;
use crate::urlrequest::context::FetchConfig;
use crate::urlrequest::request::FetchRequest;
use serde_json::Value;
use url::Url;

/// Read-only Discourse JSON client.
pub struct LinuxDoClient {
    base: Url,
    headers: OrderedHeaderMap,
    fetcher: Fetcher,
}

impl LinuxDoClient {
    /// Client for linux.do with the `curl` challenge fallback.
    pub fn new(config: &FetchConfig, cookie: Option<&str>) -> Result<Self> {
        let headers = default_headers(&config.user_agent, cookie)?;
        Self::with_fetcher(BASE_URL, headers, Fetcher::with_curl_fallback(config))
    }

    pub fn with_fetcher(base: &str, headers: OrderedHeaderMap, fetcher: Fetcher) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self {
            base,
            headers,
            fetcher,
        })
    }

    /// GET `path` (with query) relative to the site root.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self
            .base
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        let request = FetchRequest::new(url, self.headers.clone());
        self.fetcher.fetch_json(&request).await
    }
}

/// `User-Agent`, `Accept` and, when logged in, `Cookie`.
pub fn default_headers(user_agent: &str, cookie: Option<&str>) -> Result<OrderedHeaderMap> {
    let mut headers = OrderedHeaderMap::new();
    headers.insert("User-Agent", user_agent)?;
    headers.insert("Accept", "application/json")?;
    if let Some(cookie) = cookie {
        headers.insert("Cookie", cookie)?;
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers() {
        let h = default_headers("ua/1", Some("_t=1")).unwrap();
        assert_eq!(h.names(), vec!["user-agent", "accept", "cookie"]);
        let anon = default_headers("ua/1", None).unwrap();
        assert!(anon.get("cookie").is_none());
    }
}
