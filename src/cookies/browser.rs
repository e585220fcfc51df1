//! Chrome cookie extraction from the local SQLite store.
//!
//! The live database is never opened directly: it is copied into a private
//! temporary file first, so a running Chrome holding its lock does not get in
//! the way, and the copy is removed on every exit path.

use crate::base::context::IoResultExt;
use crate::base::error::{Error, Result};
use crate::cookies::chromedb::CookieDbLocation;
use crate::cookies::decrypt::{CookieKey, KeySource, KeychainKey};
use crate::cookies::oscrypt::{self, HostDigest};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Which rows to read: cookie names (empty = all) on an ordered list of
/// target domains. Earlier domains win when a name appears on several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieQuery {
    names: Vec<String>,
    hosts: Vec<String>,
}

impl CookieQuery {
    pub fn for_hosts<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Vec::new(),
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of the first target domain that `host_key` belongs to.
    pub fn host_rank(&self, host_key: &str) -> Option<usize> {
        self.hosts.iter().position(|d| host_matches(host_key, d))
    }

    fn wants_name(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.iter().any(|n| n == name)
    }

    fn sql(&self) -> (String, Vec<String>) {
        let mut params = Vec::new();
        let host_clause = self
            .hosts
            .iter()
            .map(|h| {
                params.push(format!("%{h}"));
                format!("host_key LIKE ?{}", params.len())
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        let mut sql = String::from(
            "SELECT host_key, name, value, encrypted_value FROM cookies WHERE (",
        );
        sql.push_str(if host_clause.is_empty() { "0" } else { &host_clause });
        sql.push(')');

        if !self.names.is_empty() {
            let placeholders = self
                .names
                .iter()
                .map(|n| {
                    params.push(n.clone());
                    format!("?{}", params.len())
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND name IN ({placeholders})"));
        }
        sql.push_str(" ORDER BY rowid");
        (sql, params)
    }
}

/// `host_key` is the domain itself or one of its subdomains.
pub fn host_matches(host_key: &str, domain: &str) -> bool {
    let host = host_key.trim_start_matches('.');
    host.eq_ignore_ascii_case(domain)
        || host
            .len()
            .checked_sub(domain.len() + 1)
            .is_some_and(|split| {
                host.as_bytes()[split] == b'.' && host[split + 1..].eq_ignore_ascii_case(domain)
            })
}

/// A decrypted cookie picked from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub host_key: String,
    pub name: String,
    pub value: String,
}

/// Anything that can answer a [`CookieQuery`].
pub trait CookieSource {
    /// Best value per cookie name, in query-name order (or first-seen order
    /// when the query names none).
    fn read_cookies(&self, query: &CookieQuery) -> Result<Vec<StoredCookie>>;
}

struct ChromeCookieRow {
    host_key: String,
    name: String,
    value: Option<String>,
    encrypted_value: Option<Vec<u8>>,
}

/// Rows of one snapshot and its schema version.
struct Snapshot {
    version: Option<i64>,
    rows: Vec<ChromeCookieRow>,
}

/// Asks the key source only when a row is actually encrypted, so stores
/// holding plaintext values never touch the keychain.
struct LazyKey<'a, K> {
    source: &'a K,
    key: Option<CookieKey>,
}

impl<'a, K: KeySource> LazyKey<'a, K> {
    fn new(source: &'a K) -> Self {
        Self { source, key: None }
    }

    fn get(&mut self) -> Result<&CookieKey> {
        match &mut self.key {
            Some(key) => Ok(key),
            slot => Ok(slot.insert(self.source.key()?)),
        }
    }
}

/// `meta.version` of a Chrome cookie database; `None` when absent.
fn schema_version(conn: &Connection) -> Result<Option<i64>> {
    let has_meta = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'meta'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_meta {
        return Ok(None);
    }
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = 'version'", [], |row| {
            row.get::<_, SqlValue>(0)
        })
        .optional()?;
    Ok(match value {
        Some(SqlValue::Integer(v)) => Some(v),
        Some(SqlValue::Text(t)) => t.trim().parse().ok(),
        _ => None,
    })
}

/// Reader for the Chrome cookie database.
pub struct ChromeCookieReader<K = KeychainKey> {
    location: CookieDbLocation,
    key_source: K,
}

impl ChromeCookieReader<KeychainKey> {
    pub fn new(location: CookieDbLocation) -> Self {
        Self {
            location,
            key_source: KeychainKey,
        }
    }
}

impl<K: KeySource> ChromeCookieReader<K> {
    pub fn with_key_source(location: CookieDbLocation, key_source: K) -> Self {
        Self {
            location,
            key_source,
        }
    }

    fn query_rows(db_path: &Path, query: &CookieQuery) -> Result<Snapshot> {
        let snapshot = snapshot_db(db_path)?;
        let conn = Connection::open_with_flags(snapshot.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let version = schema_version(&conn)?;

        let (sql, params) = query.sql();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                Ok(ChromeCookieRow {
                    host_key: row.get(0)?,
                    name: row.get(1)?,
                    value: row.get(2)?,
                    encrypted_value: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Snapshot { version, rows })
    }
}

impl<K: KeySource> CookieSource for ChromeCookieReader<K> {
    fn read_cookies(&self, query: &CookieQuery) -> Result<Vec<StoredCookie>> {
        let db_path = self.location.resolve()?;
        let Snapshot { version, rows } = Self::query_rows(&db_path, query)?;
        debug!(path = %db_path.display(), rows = rows.len(), ?version, "queried cookie snapshot");
        let digest = HostDigest::for_db_version(version);
        let mut lazy_key = LazyKey::new(&self.key_source);

        let mut candidates = 0usize;
        let mut failures = 0usize;
        let mut picked: Vec<(usize, StoredCookie)> = Vec::new();

        for row in rows {
            if !query.wants_name(&row.name) {
                continue;
            }
            let Some(rank) = query.host_rank(&row.host_key) else {
                continue;
            };
            candidates += 1;

            let plain = row.value.as_deref().unwrap_or("").trim().to_string();
            let value = if !plain.is_empty() {
                plain
            } else {
                let encrypted = row.encrypted_value.as_deref().unwrap_or_default();
                let key: &[u8; 16] = if oscrypt::is_encrypted(encrypted) {
                    lazy_key.get()?
                } else {
                    &NO_KEY
                };
                match oscrypt::decrypt_cookie_value_with(key, &row.host_key, encrypted, digest) {
                    Ok(v) => v,
                    Err(e) => {
                        failures += 1;
                        debug!(host = %row.host_key, name = %row.name, error = %e, "skipping cookie row");
                        continue;
                    }
                }
            };
            if value.is_empty() {
                continue;
            }

            let cookie = StoredCookie {
                host_key: row.host_key,
                name: row.name,
                value,
            };
            match picked.iter_mut().find(|(_, c)| c.name == cookie.name) {
                Some(slot) if rank < slot.0 => *slot = (rank, cookie),
                Some(_) => {}
                None => picked.push((rank, cookie)),
            }
        }

        if picked.is_empty() && failures > 0 && failures == candidates {
            return Err(Error::cookie_decryption_failed(format!(
                "all {failures} matching cookie rows failed to decrypt"
            )));
        }

        let mut out: Vec<StoredCookie> = picked.into_iter().map(|(_, c)| c).collect();
        if !query.names().is_empty() {
            out.sort_by_key(|c| query.names().iter().position(|n| *n == c.name));
        }
        Ok(out)
    }
}

/// Placeholder for values that carry no encryption prefix; never used to
/// decrypt.
const NO_KEY: [u8; 16] = [0; 16];

/// Copy the database into a private temporary file.
///
/// The returned handle deletes the copy when dropped.
pub fn snapshot_db(db_path: &Path) -> Result<NamedTempFile> {
    let snapshot = tempfile::Builder::new()
        .prefix("sessiontap-cookies-")
        .suffix(".db")
        .tempfile()
        .path_context(&std::env::temp_dir())?;
    std::fs::copy(db_path, snapshot.path()).path_context(db_path)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matches() {
        assert!(host_matches(".x.com", "x.com"));
        assert!(host_matches("x.com", "x.com"));
        assert!(host_matches("api.x.com", "x.com"));
        assert!(!host_matches(".box.com", "x.com"));
        assert!(!host_matches("x.com.evil", "x.com"));
        assert!(host_matches(".TWITTER.com", "twitter.com"));
    }

    #[test]
    fn test_host_rank_order() {
        let q = CookieQuery::for_hosts(["x.com", "twitter.com"]);
        assert_eq!(q.host_rank(".x.com"), Some(0));
        assert_eq!(q.host_rank(".twitter.com"), Some(1));
        assert_eq!(q.host_rank(".example.com"), None);
    }

    #[test]
    fn test_sql_binds_hosts_and_names() {
        let q = CookieQuery::for_hosts(["x.com", "twitter.com"]).with_names(["auth_token", "ct0"]);
        let (sql, params) = q.sql();
        assert!(sql.contains("host_key LIKE ?1 OR host_key LIKE ?2"));
        assert!(sql.contains("name IN (?3, ?4)"));
        assert_eq!(params, vec!["%x.com", "%twitter.com", "auth_token", "ct0"]);
    }

    #[test]
    fn test_sql_without_names() {
        let (sql, params) = CookieQuery::for_hosts(["linux.do"]).sql();
        assert!(!sql.contains("name IN"));
        assert_eq!(params, vec!["%linux.do"]);
    }

    #[test]
    fn test_snapshot_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("Cookies");
        std::fs::write(&db, b"data").unwrap();

        let snapshot = snapshot_db(&db).unwrap();
        let path = snapshot.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"data");
        drop(snapshot);
        assert!(!path.exists());
    }
}
