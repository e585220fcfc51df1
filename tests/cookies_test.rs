//! Chrome cookie store tests against a fixture database.
//!
//! Covers:
//! - v10 decryption with and without the host digest
//! - host ranking (x.com over twitter.com)
//! - per-row failure handling
//! - schema-gated host digest and on-demand key lookup
//! - credential resolution through the store

use rusqlite::Connection;
use sessiontap::base::error::Error;
use sessiontap::base::platform::Platform;
use sessiontap::cookies::browser::{ChromeCookieReader, CookieQuery, CookieSource};
use sessiontap::cookies::chromedb::CookieDbLocation;
use sessiontap::cookies::credentials::{
    CredentialResolver, CredentialSource, CredentialSpec, PartialCredential,
};
use sessiontap::cookies::decrypt::{CookieKey, KeySource, PasswordKey};
use sessiontap::cookies::oscrypt::encrypt_cookie_value;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

const PASSWORD: &str = "peanuts";

enum Row<'a> {
    Plain(&'a str, &'a str, &'a str),
    Encrypted(&'a str, &'a str, &'a str, bool),
    Raw(&'a str, &'a str, &'a [u8]),
}

fn fixture(rows: &[Row<'_>]) -> TempDir {
    fixture_at_version(rows, None)
}

/// `version` fills a Chrome-style `meta` table.
fn fixture_at_version(rows: &[Row<'_>], version: Option<i64>) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::open(dir.path().join("Cookies")).unwrap();
    conn.execute_batch(
        "CREATE TABLE cookies (host_key TEXT NOT NULL, name TEXT NOT NULL, \
         value TEXT NOT NULL DEFAULT '', encrypted_value BLOB NOT NULL DEFAULT x'');",
    )
    .unwrap();
    if let Some(version) = version {
        conn.execute_batch(
            "CREATE TABLE meta (key LONGVARCHAR NOT NULL UNIQUE PRIMARY KEY, value LONGVARCHAR);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('version', ?1)",
            rusqlite::params![version],
        )
        .unwrap();
    }

    let key = PasswordKey::new(PASSWORD).key().unwrap();
    for row in rows {
        let (host, name, value, blob): (&str, &str, &str, Vec<u8>) = match row {
            Row::Plain(h, n, v) => (*h, *n, *v, Vec::new()),
            Row::Encrypted(h, n, v, digest) => (
                *h,
                *n,
                "",
                encrypt_cookie_value(&key, h, v, *digest).unwrap(),
            ),
            Row::Raw(h, n, b) => (*h, *n, "", b.to_vec()),
        };
        conn.execute(
            "INSERT INTO cookies (host_key, name, value, encrypted_value) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![host, name, value, blob],
        )
        .unwrap();
    }
    dir
}

fn reader(dir: &Path) -> ChromeCookieReader<PasswordKey> {
    ChromeCookieReader::with_key_source(
        CookieDbLocation::new().with_profile_dir(dir),
        PasswordKey::new(PASSWORD),
    )
}

fn twitter_query() -> CookieQuery {
    CredentialSpec::twitter().query()
}

#[test]
fn test_decrypts_and_prefers_x_com() {
    let db = fixture(&[
        Row::Encrypted(".twitter.com", "auth_token", "old-token", false),
        Row::Encrypted(".x.com", "auth_token", "new-token", true),
        Row::Encrypted(".x.com", "ct0", "csrf-1", false),
        Row::Plain(".x.com", "guest_id", "ignored"),
        Row::Plain(".box.com", "ct0", "wrong-site"),
    ]);

    let cookies = reader(db.path()).read_cookies(&twitter_query()).unwrap();
    let pairs: Vec<(&str, &str)> = cookies
        .iter()
        .map(|c| (c.name.as_str(), c.value.as_str()))
        .collect();
    assert_eq!(pairs, vec![("auth_token", "new-token"), ("ct0", "csrf-1")]);
}

#[test]
fn test_plaintext_column_wins() {
    let db = fixture(&[Row::Plain("linux.do", "_t", "plain-session")]);
    let cookies = reader(db.path())
        .read_cookies(&CookieQuery::for_hosts(["linux.do"]))
        .unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value, "plain-session");
}

#[test]
fn test_unknown_prefix_is_plaintext() {
    let db = fixture(&[Row::Raw(".x.com", "ct0", b"raw-ct0\x00\x00")]);
    let cookies = reader(db.path()).read_cookies(&twitter_query()).unwrap();
    assert_eq!(cookies[0].value, "raw-ct0");
}

#[test]
fn test_failed_row_skipped_when_another_succeeds() {
    let db = fixture(&[
        Row::Raw(".x.com", "auth_token", b"v10abcdefghijklmno"),
        Row::Encrypted(".twitter.com", "auth_token", "fallback-token", true),
    ]);
    let cookies = reader(db.path()).read_cookies(&twitter_query()).unwrap();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].host_key, ".twitter.com");
    assert_eq!(cookies[0].value, "fallback-token");
}

#[test]
fn test_all_rows_failing() {
    let db = fixture(&[
        Row::Raw(".x.com", "auth_token", b"v10abcdefghijklmno"),
        Row::Raw(".x.com", "ct0", b"v11abc"),
    ]);
    let err = reader(db.path()).read_cookies(&twitter_query()).unwrap_err();
    assert!(matches!(err, Error::CookieDecryptionFailed { .. }), "{err:?}");
}

#[test]
fn test_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let err = reader(&dir.path().join("nope"))
        .read_cookies(&twitter_query())
        .unwrap_err();
    assert!(matches!(err, Error::CookieDbNotFound { .. }));
}

#[test]
fn test_resolver_completes_from_store() {
    let db = fixture(&[
        Row::Encrypted(".x.com", "auth_token", "store-token", true),
        Row::Encrypted(".x.com", "ct0", "store-csrf", true),
    ]);
    let spec = CredentialSpec::twitter();
    let resolver = CredentialResolver::new(&spec, Platform::MacOs, |name: &str| {
        (name == "CT0").then(|| "env-csrf".to_string())
    });

    let (cred, source) = resolver
        .resolve(PartialCredential::default(), &reader(db.path()))
        .unwrap();
    assert_eq!(source, CredentialSource::BrowserStore);
    assert_eq!(cred.session, "store-token");
    // The environment half is kept; the store only fills the gap.
    assert_eq!(cred.csrf, "env-csrf");
}

#[test]
fn test_resolver_off_macos_never_reads_store() {
    let spec = CredentialSpec::twitter();
    let resolver = CredentialResolver::new(&spec, Platform::Linux, |_: &str| None);
    let missing = tempfile::tempdir().unwrap();
    let err = resolver
        .resolve(
            PartialCredential::new(Some("a"), None),
            &reader(&missing.path().join("none")),
        )
        .unwrap_err();
    assert!(matches!(err, Error::PlatformNotSupported(_)));
}

#[test]
fn test_schema_version_gates_host_digest() {
    let rows = [Row::Encrypted(".x.com", "ct0", "csrf-current", true)];

    let current = fixture_at_version(&rows, Some(24));
    let cookies = reader(current.path()).read_cookies(&twitter_query()).unwrap();
    assert_eq!(cookies[0].value, "csrf-current");

    // Before schema 24 the leading bytes are part of the value.
    let legacy = fixture_at_version(&rows, Some(23));
    let cookies = reader(legacy.path()).read_cookies(&twitter_query()).unwrap();
    assert_ne!(cookies[0].value, "csrf-current");
    assert!(cookies[0].value.ends_with("csrf-current"));
}

/// Counts key requests and always fails, like a denied keychain prompt.
struct DeniedKey {
    calls: Rc<Cell<usize>>,
}

impl KeySource for DeniedKey {
    fn key(&self) -> sessiontap::base::error::Result<CookieKey> {
        self.calls.set(self.calls.get() + 1);
        Err(Error::KeyringUnavailable {
            services: "Chrome Safe Storage".to_string(),
        })
    }
}

fn denied_reader(dir: &Path) -> (ChromeCookieReader<DeniedKey>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let reader = ChromeCookieReader::with_key_source(
        CookieDbLocation::new().with_profile_dir(dir),
        DeniedKey {
            calls: calls.clone(),
        },
    );
    (reader, calls)
}

#[test]
fn test_plaintext_store_never_asks_for_key() {
    let db = fixture(&[
        Row::Plain(".x.com", "auth_token", "plain-token"),
        Row::Raw(".x.com", "ct0", b"raw-ct0"),
    ]);
    let (reader, calls) = denied_reader(db.path());
    let cookies = reader.read_cookies(&twitter_query()).unwrap();
    assert_eq!(cookies.len(), 2);
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_encrypted_row_asks_for_key_once() {
    let db = fixture(&[
        Row::Plain(".x.com", "auth_token", "plain-token"),
        Row::Encrypted(".x.com", "ct0", "csrf", true),
    ]);
    let (reader, calls) = denied_reader(db.path());
    let err = reader.read_cookies(&twitter_query()).unwrap_err();
    assert!(matches!(err, Error::KeyringUnavailable { .. }));
    assert_eq!(calls.get(), 1);
}
