//! Primary HTTP transport: ConnectJob socket + hyper HTTP/1.1.

use crate::base::error::{Error, Result};
use crate::http::response::{read_snippet, read_text};
use crate::socket::connectjob::ConnectJob;
use crate::urlrequest::context::FetchConfig;
use crate::urlrequest::request::FetchRequest;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{HOST, LOCATION};
use http::{Method, Request, Response, Version};
use http_body_util::Empty;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tracing::debug;
use url::{Position, Url};

/// Redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// One way of performing a GET and returning the body text.
///
/// Non-2xx responses surface as [`Error::HttpStatus`] with a bounded body
/// snippet; transport failures as network errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    async fn get(&self, request: &FetchRequest) -> Result<String>;
}

/// In-process transport over tokio, BoringSSL and hyper.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    config: FetchConfig,
}

impl HyperTransport {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    async fn get_following(&self, request: &FetchRequest) -> Result<String> {
        let mut current = request.clone();
        let mut redirects = 0;
        loop {
            let response = self.send_once(&current).await?;
            let status = response.status();
            let url = current.url.to_string();

            if status.is_redirection() {
                if let Some(next) = redirect_target(&current.url, &response)? {
                    if redirects == MAX_REDIRECTS {
                        return Err(Error::TooManyRedirects {
                            url: request.url.to_string(),
                        });
                    }
                    redirects += 1;
                    debug!(from = %url, to = %next, status = status.as_u16(), "following redirect");
                    current = current.redirect_to(next);
                    continue;
                }
            }

            if !status.is_success() {
                let snippet = read_snippet(response.into_body()).await;
                return Err(Error::HttpStatus {
                    status: status.as_u16(),
                    url,
                    snippet,
                });
            }

            return read_text(response.into_body(), &url).await;
        }
    }

    async fn send_once(&self, request: &FetchRequest) -> Result<Response<Incoming>> {
        let url = request.url.as_str();
        let socket = ConnectJob::new(&request.url, self.config.proxy.as_ref())
            .connect()
            .await?;

        let io = TokioIo::new(socket);
        let (mut sender, conn) = http1::handshake::<_, Empty<Bytes>>(io)
            .await
            .map_err(|e| Error::network(url, e))?;

        // Drive the connection until the response body is done.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "connection closed with error");
            }
        });

        let req = build_http_request(request)?;
        debug!(%url, "sending request");
        sender
            .send_request(req)
            .await
            .map_err(|e| Error::network(url, e))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    fn name(&self) -> &'static str {
        "hyper"
    }

    async fn get(&self, request: &FetchRequest) -> Result<String> {
        match tokio::time::timeout(self.config.timeout, self.get_following(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::network(
                request.url.as_str(),
                format!("timed out after {:?}", self.config.timeout),
            )),
        }
    }
}

/// Origin-form request with `host` first, then the caller's headers in order.
fn build_http_request(request: &FetchRequest) -> Result<Request<Empty<Bytes>>> {
    let url = &request.url;
    let target = &url[Position::BeforePath..Position::AfterQuery];
    let authority = &url[Position::BeforeHost..Position::AfterPort];

    let mut builder = Request::builder()
        .method(Method::GET)
        .uri(target)
        .version(Version::HTTP_11)
        .header(HOST, authority);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    builder
        .body(Empty::new())
        .map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))
}

fn redirect_target<B>(base: &Url, response: &Response<B>) -> Result<Option<Url>> {
    let Some(location) = response.headers().get(LOCATION) else {
        return Ok(None);
    };
    let location = location
        .to_str()
        .map_err(|_| Error::network(base.as_str(), "non-ASCII Location header"))?;
    base.join(location)
        .map(Some)
        .map_err(|e| Error::InvalidUrl(format!("redirect to {location}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::orderedheaders::OrderedHeaderMap;

    #[test]
    fn test_origin_form_and_host() {
        let mut headers = OrderedHeaderMap::new();
        headers.insert("accept", "*/*").unwrap();
        let req = FetchRequest::get("https://x.com:8443/i/api?a=1#frag", headers).unwrap();
        let http_req = build_http_request(&req).unwrap();
        assert_eq!(http_req.uri().to_string(), "/i/api?a=1");
        let names: Vec<_> = http_req.headers().keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["host", "accept"]);
        assert_eq!(http_req.headers()[HOST], "x.com:8443");
    }

    #[test]
    fn test_relative_redirect() {
        let base = Url::parse("https://linux.do/t/1.json").unwrap();
        let resp = Response::builder()
            .status(302)
            .header(LOCATION, "/t/slug/1.json")
            .body(())
            .unwrap();
        let next = redirect_target(&base, &resp).unwrap().unwrap();
        assert_eq!(next.as_str(), "https://linux.do/t/slug/1.json");
    }
}
