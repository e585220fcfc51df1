//! Response body reading.
//! Mirrors Chromium's HttpStream::ReadResponseBody with hard size bounds.

use crate::base::error::{Error, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;

/// Bytes of an error response kept for the error message.
pub const MAX_ERROR_SNIPPET: usize = 400;

/// Upper bound on a successful response body.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Read at most `limit` bytes from the body, then stop.
///
/// Used for HTTP error responses, where only a prefix is wanted and the
/// rest of the body is never read.
pub async fn read_prefix<B>(mut body: B, limit: usize) -> Vec<u8>
where
    B: Body<Data = Bytes> + Unpin,
{
    let mut out = Vec::with_capacity(limit.min(4096));
    while out.len() < limit {
        match body.frame().await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    let take = data.len().min(limit - out.len());
                    out.extend_from_slice(&data[..take]);
                }
            }
            Some(Err(_)) | None => break,
        }
    }
    out
}

/// Error-response snippet: a bounded prefix, lossily decoded and trimmed.
pub async fn read_snippet<B>(body: B) -> String
where
    B: Body<Data = Bytes> + Unpin,
{
    let prefix = read_prefix(body, MAX_ERROR_SNIPPET).await;
    String::from_utf8_lossy(&prefix).trim().to_string()
}

/// Read a whole (bounded) body as lossy UTF-8.
pub async fn read_text<B>(body: B, url: &str) -> Result<String>
where
    B: Body<Data = Bytes>,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let collected = Limited::new(body, MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| Error::network(url, format!("failed reading body: {e}")))?;
    Ok(String::from_utf8_lossy(&collected.to_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[tokio::test]
    async fn test_prefix_is_bounded() {
        let body = Full::new(Bytes::from(vec![b'a'; 1000]));
        let prefix = read_prefix(body, MAX_ERROR_SNIPPET).await;
        assert_eq!(prefix.len(), MAX_ERROR_SNIPPET);
    }

    #[tokio::test]
    async fn test_short_body_prefix() {
        let body = Full::new(Bytes::from_static(b"  Unauthorized \n"));
        assert_eq!(read_snippet(body).await, "Unauthorized");
    }

    #[tokio::test]
    async fn test_read_text_is_lossy() {
        let body = Full::new(Bytes::from_static(b"ok \xff"));
        let text = read_text(body, "https://x.com").await.unwrap();
        assert_eq!(text, "ok \u{fffd}");
    }
}
