//! X/Twitter notified timeline (`device_follow`).
//!
//! The pipeline is: validate and build the URL, resolve the session
//! credential, build the ordered header set, fetch once, normalize, render.
//! Everything that can be rejected locally is rejected before the first
//! network call.

pub mod headers;
pub mod normalize;
pub mod params;
pub mod present;

use crate::base::error::{Error, Result};
use crate::cookies::credentials::{Credential, CredentialSource};
use crate::http::fetcher::Fetcher;
use crate::urlrequest::request::{parse_param_overrides, FetchRequest};
use headers::{build_headers, ClientIds};
use params::{build_request_url, TimelineUrl};
use present::OutputFormat;
use serde_json::Value;
use std::future::Future;
use tracing::{info, warn};

pub use normalize::{parse_timeline, Tweet};

#[derive(Debug, Clone)]
pub struct TimelineOptions {
    pub count: u32,
    pub request_url: Option<String>,
    /// Raw `KEY=VALUE` overrides, applied in order.
    pub params: Vec<String>,
    pub bearer_token: String,
    pub referer: String,
    pub format: OutputFormat,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            count: 20,
            request_url: None,
            params: Vec::new(),
            bearer_token: params::DEFAULT_BEARER_TOKEN.to_string(),
            referer: params::DEFAULT_REFERER.to_string(),
            format: OutputFormat::Text,
        }
    }
}

/// Validate the options and build the final URL.
pub fn prepare_url(opts: &TimelineOptions) -> Result<TimelineUrl> {
    if opts.count == 0 {
        return Err(Error::InvalidInput(
            "--count must be a positive integer".to_string(),
        ));
    }
    let overrides = parse_param_overrides(&opts.params)?;
    build_request_url(opts.request_url.as_deref(), &overrides, opts.count)
}

pub fn build_timeline_request(
    opts: &TimelineOptions,
    url: &TimelineUrl,
    cred: &Credential,
) -> Result<FetchRequest> {
    let headers = build_headers(cred, &opts.bearer_token, &opts.referer, &ClientIds::generate())?;
    Ok(FetchRequest::new(url.url.clone(), headers))
}

/// Run the whole timeline pipeline and return the rendered output.
///
/// `resolve_credential` is only called once the options are known to be
/// valid.
pub async fn run_timeline<F, Fut>(
    opts: &TimelineOptions,
    resolve_credential: F,
    fetcher: &Fetcher,
) -> Result<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(Credential, CredentialSource)>>,
{
    let url = prepare_url(opts)?;
    let (cred, source) = resolve_credential().await?;

    if url.used_default_query {
        warn!(
            "using built-in query params ({} keys). Use --request-url with captured full URL for exact parity.",
            url.param_count()
        );
    }
    info!("credentials source: {source}");

    let request = build_timeline_request(opts, &url, &cred)?;
    let payload = fetcher.fetch_json(&request).await?;
    if !payload.is_object() {
        return Err(Error::UnexpectedShape(
            "unexpected response payload type".to_string(),
        ));
    }

    render(opts, &payload)
}

fn render(opts: &TimelineOptions, payload: &Value) -> Result<String> {
    if opts.format == OutputFormat::RawJson {
        return present::render_json(payload);
    }
    let tweets = parse_timeline(payload, opts.count as usize)?;
    match opts.format {
        OutputFormat::Json => present::render_json(&tweets),
        _ => Ok(present::render_text(&tweets)),
    }
}
