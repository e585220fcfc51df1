//! User-Agent matching the local Chrome, so a `cf_clearance` cookie taken
//! from that browser stays valid.

use std::path::Path;
use tokio::process::Command;
use tracing::debug;

pub const UA_ENV: &str = "LINUXDO_UA";
pub const CHROME_APP: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";
pub const DEFAULT_CHROME_VERSION: &str = "130.0.0.0";

pub fn user_agent_for_version(version: &str) -> String {
    format!(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/{version} Safari/537.36"
    )
}

/// `Google Chrome 144.0.7559.133` → `144.0.0.0`.
pub fn parse_chrome_version(output: &str) -> Option<String> {
    let full = output.split_whitespace().last()?;
    let major = full.split('.').next()?;
    if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{major}.0.0.0"))
}

async fn detect_chrome_version() -> Option<String> {
    if !Path::new(CHROME_APP).is_file() {
        return None;
    }
    let output = Command::new(CHROME_APP)
        .arg("--version")
        .kill_on_drop(true)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_chrome_version(&String::from_utf8_lossy(&output.stdout))
}

/// `LINUXDO_UA`, else the detected Chrome major version, else Chrome 130.
pub async fn resolve_user_agent<E>(env: E) -> String
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(ua) = env(UA_ENV).filter(|v| !v.trim().is_empty()) {
        return ua.trim().to_string();
    }
    let version = detect_chrome_version().await;
    debug!(detected = ?version, "chrome version");
    user_agent_for_version(version.as_deref().unwrap_or(DEFAULT_CHROME_VERSION))
}
