use crate::base::error::Result;
use crate::cookies::credentials::Credential;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::twitter::params::normalize_bearer_token;
use crate::urlrequest::context::DEFAULT_USER_AGENT;
use uuid::Uuid;

/// Fresh per-invocation client identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIds {
    pub client_uuid: String,
    pub device_id: String,
    pub transaction_id: String,
}

impl ClientIds {
    pub fn generate() -> Self {
        // Seeded from a v4 UUID in case the BoringSSL RNG call fails.
        let mut raw = *Uuid::new_v4().as_bytes();
        if let Err(e) = boring::rand::rand_bytes(&mut raw) {
            tracing::debug!(error = %e, "rand_bytes failed");
        }
        Self {
            client_uuid: Uuid::new_v4().to_string(),
            device_id: Uuid::new_v4().to_string(),
            transaction_id: raw.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

/// Header set of the web client, in the order it sends them.
pub fn build_headers(
    cred: &Credential,
    bearer_token: &str,
    referer: &str,
    ids: &ClientIds,
) -> Result<OrderedHeaderMap> {
    let mut h = OrderedHeaderMap::new();
    h.insert("accept", "*/*")?;
    h.insert("accept-language", "en-US,en;q=0.9")?;
    h.insert("authorization", &normalize_bearer_token(bearer_token))?;
    h.insert("content-type", "application/json")?;
    h.insert(
        "cookie",
        &format!("auth_token={}; ct0={}", cred.session, cred.csrf),
    )?;
    h.insert("origin", "https://x.com")?;
    h.insert("referer", referer)?;
    h.insert("user-agent", DEFAULT_USER_AGENT)?;
    h.insert("x-csrf-token", &cred.csrf)?;
    h.insert("x-twitter-active-user", "yes")?;
    h.insert("x-twitter-auth-type", "OAuth2Session")?;
    h.insert("x-twitter-client-language", "en")?;
    h.insert("x-client-uuid", &ids.client_uuid)?;
    h.insert("x-twitter-client-deviceid", &ids.device_id)?;
    h.insert("x-client-transaction-id", &ids.transaction_id)?;
    Ok(h)
}
