use async_trait::async_trait;
use sessiontap::base::error::{Error, ErrorKind, Result};
use sessiontap::http::{Fetcher, OrderedHeaderMap, Transport};
use sessiontap::urlrequest::FetchRequest;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CHALLENGE_PAGE: &str =
    "<html><head><title>Just a moment...</title></head><script>__cf_chl_opt={}</script></html>";

/// Replays one canned outcome and counts calls.
struct Canned {
    name: &'static str,
    outcome: fn() -> Result<String>,
    calls: Arc<AtomicUsize>,
}

impl Canned {
    fn boxed(name: &'static str, outcome: fn() -> Result<String>) -> (Box<dyn Transport>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = Canned {
            name,
            outcome,
            calls: calls.clone(),
        };
        (Box::new(transport), calls)
    }
}

#[async_trait]
impl Transport for Canned {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get(&self, _request: &FetchRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn request() -> FetchRequest {
    FetchRequest::get("https://linux.do/latest.json", OrderedHeaderMap::new()).unwrap()
}

fn ok_json() -> Result<String> {
    Ok("{\"topic_list\":{\"topics\":[]}}".to_string())
}

fn challenge_body() -> Result<String> {
    Ok(CHALLENGE_PAGE.to_string())
}

fn challenge_403() -> Result<String> {
    Err(Error::HttpStatus {
        status: 403,
        url: "https://linux.do/latest.json".to_string(),
        snippet: CHALLENGE_PAGE.to_string(),
    })
}

fn plain_404() -> Result<String> {
    Err(Error::HttpStatus {
        status: 404,
        url: "https://linux.do/latest.json".to_string(),
        snippet: "not found".to_string(),
    })
}

fn refused() -> Result<String> {
    Err(Error::network("https://linux.do/latest.json", "connection refused"))
}

#[tokio::test]
async fn test_primary_success_skips_fallback() {
    let (primary, p_calls) = Canned::boxed("primary", ok_json);
    let (fallback, f_calls) = Canned::boxed("curl", ok_json);
    let fetcher = Fetcher::new(primary).with_fallback(fallback);

    let value = fetcher.fetch_json(&request()).await.unwrap();
    assert!(value["topic_list"]["topics"].is_array());
    assert_eq!(p_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_challenge_body_uses_fallback_once() {
    let (primary, _) = Canned::boxed("primary", challenge_body);
    let (fallback, f_calls) = Canned::boxed("curl", ok_json);
    let fetcher = Fetcher::new(primary).with_fallback(fallback);

    let text = fetcher.fetch_text(&request()).await.unwrap();
    assert!(text.contains("topic_list"));
    assert_eq!(f_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_challenge_status_uses_fallback() {
    let (primary, _) = Canned::boxed("primary", challenge_403);
    let (fallback, f_calls) = Canned::boxed("curl", ok_json);
    let fetcher = Fetcher::new(primary).with_fallback(fallback);

    assert!(fetcher.fetch_text(&request()).await.is_ok());
    assert_eq!(f_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_both_challenged_is_blocked() {
    let (primary, _) = Canned::boxed("primary", challenge_403);
    let (fallback, _) = Canned::boxed("curl", challenge_body);
    let fetcher = Fetcher::new(primary).with_fallback(fallback);

    match fetcher.fetch_text(&request()).await.unwrap_err() {
        Error::Blocked { primary, fallback } => {
            assert!(primary.contains("HTTP 403"));
            assert!(fallback.contains("curl"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fallback_failure_reports_both() {
    let (primary, _) = Canned::boxed("primary", challenge_body);
    let (fallback, _) = Canned::boxed("curl", refused);
    let fetcher = Fetcher::new(primary).with_fallback(fallback);

    let err = fetcher.fetch_text(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    let message = err.to_string();
    assert!(message.contains("connection refused"), "{message}");
}

#[tokio::test]
async fn test_other_failures_do_not_fall_back() {
    for outcome in [plain_404 as fn() -> Result<String>, refused] {
        let (primary, _) = Canned::boxed("primary", outcome);
        let (fallback, f_calls) = Canned::boxed("curl", ok_json);
        let fetcher = Fetcher::new(primary).with_fallback(fallback);

        assert!(fetcher.fetch_text(&request()).await.is_err());
        assert_eq!(f_calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_invalid_json_keeps_prefix() {
    let (primary, _) = Canned::boxed("primary", || Ok("<html>not json</html>".to_string()));
    let fetcher = Fetcher::new(primary);

    match fetcher.fetch_json(&request()).await.unwrap_err() {
        Error::JsonParse { prefix, .. } => assert!(prefix.starts_with("<html>")),
        other => panic!("unexpected error: {other:?}"),
    }
}
