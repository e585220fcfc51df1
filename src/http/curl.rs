//! Secondary transport that shells out to the system `curl`.
//!
//! curl's TLS stack presents a different fingerprint than BoringSSL, which
//! is sometimes enough to get past an anti-bot interstitial.

use crate::base::error::{Error, Result};
use crate::http::transport::Transport;
use crate::urlrequest::context::FetchConfig;
use crate::urlrequest::request::FetchRequest;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CurlTransport {
    config: FetchConfig,
}

impl CurlTransport {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Command-line arguments for `request`, URL last.
    pub fn args(&self, request: &FetchRequest) -> Vec<String> {
        let user_agent = request
            .headers
            .get_str("user-agent")
            .unwrap_or(&self.config.user_agent)
            .to_string();

        let mut args = vec![
            "-sS".to_string(),
            "--fail".to_string(),
            "--max-time".to_string(),
            self.config.timeout.as_secs().max(1).to_string(),
            "-L".to_string(),
            "-A".to_string(),
            user_agent,
        ];
        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.as_str().to_string());
        }
        for (name, value) in request.headers.iter() {
            if *name == http::header::USER_AGENT {
                continue;
            }
            args.push("-H".to_string());
            args.push(format!(
                "{}: {}",
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes())
            ));
        }
        args.push(request.url.to_string());
        args
    }
}

#[async_trait]
impl Transport for CurlTransport {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn get(&self, request: &FetchRequest) -> Result<String> {
        let url = request.url.as_str();
        let curl = which("curl").ok_or_else(|| Error::network(url, "curl not found on PATH"))?;

        debug!(path = %curl.display(), %url, "running curl");
        let output = Command::new(curl)
            .args(self.args(request))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::network(url, format!("failed to run curl: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::network(
                url,
                format!("curl failed ({}): {}", output.status, stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// First executable named `binary` on `PATH`.
pub fn which(binary: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &std::path::Path) -> bool {
    path.is_file()
}
