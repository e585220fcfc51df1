use crate::base::context::IoResultExt;
use crate::base::error::{Error, Result};
use crate::socket::client::SocketType;
use crate::socket::proxy::{ProxySettings, ProxyType};
use crate::socket::tls::TlsConfig;
use boring::ssl::{SslConnector, SslMethod};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::{Host, Url};

/// Upper bound on the proxy's CONNECT response head.
const MAX_TUNNEL_RESPONSE: usize = 8 * 1024;

/// Manages the connection process: DNS -> TCP -> (CONNECT) -> TLS.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob<'a> {
    url: &'a Url,
    proxy: Option<&'a ProxySettings>,
    tls: TlsConfig,
}

impl<'a> ConnectJob<'a> {
    pub fn new(url: &'a Url, proxy: Option<&'a ProxySettings>) -> Self {
        Self {
            url,
            proxy,
            tls: TlsConfig::default_chrome(),
        }
    }

    pub async fn connect(self) -> Result<SocketType> {
        let (target_host, target_port) = endpoint(self.url)?;

        let mut stream = match self.proxy {
            Some(p) => {
                if p.proxy_type() != ProxyType::Http {
                    return Err(Error::network(
                        self.url.as_str(),
                        format!("unsupported proxy scheme '{}'", p.url.scheme()),
                    ));
                }
                let (phost, pport) = endpoint(&p.url)?;
                let mut stream = tcp_connect(&phost, pport).await?;
                self.establish_tunnel(&mut stream, p).await?;
                stream
            }
            None => tcp_connect(&target_host, target_port).await?,
        };

        if self.url.scheme() != "https" {
            return Ok(SocketType::Tcp(stream));
        }

        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|e| Error::tls(&target_host, e))?;
        self.tls.apply_to_builder(&mut builder, &target_host)?;
        let connector = builder.build();

        let mut config = connector
            .configure()
            .map_err(|e| Error::tls(&target_host, e))?;
        if !TlsConfig::should_set_sni(&target_host) {
            config.set_use_server_name_indication(false);
            config.set_verify_hostname(false);
        }

        let tls_stream = tokio_boring::connect(config, &target_host, stream)
            .await
            .map_err(|e| Error::tls(&target_host, format!("handshake failed: {e}")))?;

        debug!(host = %target_host, "TLS established");
        Ok(SocketType::Ssl(tls_stream))
    }

    /// Issue `CONNECT host:port` and wait for a 2xx.
    async fn establish_tunnel(&self, stream: &mut TcpStream, proxy: &ProxySettings) -> Result<()> {
        let authority = authority(self.url)?;
        let mut connect_req = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
        if let Some(auth) = proxy.get_auth_header() {
            connect_req.push_str(&format!("Proxy-Authorization: {auth}\r\n"));
        }
        connect_req.push_str("\r\n");

        let proxy_url = proxy.url.as_str();
        stream
            .write_all(connect_req.as_bytes())
            .await
            .map_err(|e| Error::network(proxy_url, e))?;

        let mut head = Vec::with_capacity(512);
        let mut buf = [0u8; 512];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            if head.len() > MAX_TUNNEL_RESPONSE {
                return Err(Error::network(proxy_url, "oversized CONNECT response"));
            }
            let n = stream
                .read(&mut buf)
                .await
                .map_err(|e| Error::network(proxy_url, e))?;
            if n == 0 {
                return Err(Error::network(proxy_url, "proxy closed the tunnel"));
            }
            head.extend_from_slice(&buf[..n]);
        }

        let head = String::from_utf8_lossy(&head);
        let status_line = head.lines().next().unwrap_or_default();
        let status = status_line
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse::<u16>().ok());
        match status {
            Some(code) if (200..300).contains(&code) => {
                debug!(%authority, "proxy tunnel established");
                Ok(())
            }
            Some(407) => Err(Error::network(proxy_url, "proxy authentication required")),
            _ => Err(Error::network(
                proxy_url,
                format!("tunnel failed: {status_line}"),
            )),
        }
    }
}

/// Host (without IPv6 brackets) and port of a URL.
fn endpoint(url: &Url) -> Result<(String, u16)> {
    let host = match url.host() {
        Some(Host::Domain(d)) => d.to_string(),
        Some(Host::Ipv4(a)) => a.to_string(),
        Some(Host::Ipv6(a)) => a.to_string(),
        None => return Err(Error::InvalidUrl(format!("missing host in {url}"))),
    };
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::InvalidUrl(format!("missing port in {url}")))?;
    Ok((host, port))
}

fn authority(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(format!("missing host in {url}")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::InvalidUrl(format!("missing port in {url}")))?;
    Ok(format!("{host}:{port}"))
}

async fn tcp_connect(host: &str, port: u16) -> Result<TcpStream> {
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .dns_context(host)?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(s) => {
                let _ = s.set_nodelay(true);
                return Ok(s);
            }
            Err(e) => last_err = Some(e),
        }
    }
    let err = last_err
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"));
    Err(err).connection_context(host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults() {
        let url = Url::parse("https://x.com/i/api").unwrap();
        assert_eq!(endpoint(&url).unwrap(), ("x.com".to_string(), 443));
        let url = Url::parse("http://[::1]:8080/").unwrap();
        assert_eq!(endpoint(&url).unwrap(), ("::1".to_string(), 8080));
        assert_eq!(authority(&url).unwrap(), "[::1]:8080");
    }

    #[tokio::test]
    async fn test_refused_is_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
        let err = ConnectJob::new(&url, None).connect().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailedTo { port: p, .. } if p == port));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_tunnel_rejected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 407 Proxy Authentication Required\r\n\r\n")
                    .await;
            }
        });

        let proxy = ProxySettings::new(&format!("http://{addr}")).unwrap();
        let url = Url::parse("https://x.com/").unwrap();
        let err = ConnectJob::new(&url, Some(&proxy)).connect().await.unwrap_err();
        assert!(err.to_string().contains("proxy authentication required"));
    }
}
