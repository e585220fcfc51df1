//! # sessiontap
//!
//! Command-line helpers that reuse a local Chrome session.
//!
//! - `timeline`: the X/Twitter notified (`device_follow`) timeline, with
//!   credentials taken from arguments, the environment, or Chrome's
//!   encrypted cookie store
//! - `linuxdo`: a read-only linux.do (Discourse) client with a `curl`
//!   fallback for anti-bot challenge pages
//! - `diary`: local Codex/Claude session logs summarized into diary evidence
//! - `statusline`: a context-window gauge for an agent status bar
//!
//! ## Modules
//!
//! - [`base`] - Error type, exit codes, logging
//! - [`cookies`] - Chrome cookie store reading and credential resolution
//! - [`socket`] - Proxy tunnels and BoringSSL connections
//! - [`http`] - Ordered headers, transports, and the challenge-aware fetcher
//! - [`urlrequest`] - Request and fetch configuration types
//! - [`json`] - Defensive access to untyped JSON
//!
//! ```rust,no_run
//! use sessiontap::http::Fetcher;
//! use sessiontap::http::OrderedHeaderMap;
//! use sessiontap::urlrequest::context::FetchConfig;
//! use sessiontap::urlrequest::request::FetchRequest;
//!
//! # async fn demo() -> sessiontap::base::Result<()> {
//! let config = FetchConfig::from_env().with_timeout_secs(10);
//! let fetcher = Fetcher::with_curl_fallback(&config);
//! let mut headers = OrderedHeaderMap::new();
//! headers.insert("Accept", "application/json")?;
//! let request = FetchRequest::get("https://linux.do/latest.json", headers)?;
//! let body = fetcher.fetch_json(&request).await?;
//! println!("{}", body["topic_list"]["topics"].as_array().map_or(0, Vec::len));
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod cli;
pub mod cookies;
pub mod diary;
pub mod http;
pub mod json;
pub mod linuxdo;
pub mod socket;
pub mod statusline;
pub mod twitter;
pub mod urlrequest;
