//! Cookie header resolution for linux.do.
//!
//! Order: `--cookie`, `--cookie-file`, `LINUXDO_COOKIE`, the Chrome store
//! (macOS only, failure is only a warning), then anonymous.

use crate::base::context::IoResultExt;
use crate::base::error::{Error, Result};
use crate::base::platform::Platform;
use crate::cookies::browser::{CookieQuery, CookieSource};
use cookie::Cookie;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const COOKIE_ENV: &str = "LINUXDO_COOKIE";
pub const COOKIE_FILE_ENV: &str = "LINUXDO_COOKIE_FILE";
pub const COOKIE_DOMAIN: &str = "linux.do";

/// Where the cookie header came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieOrigin {
    Flag,
    File,
    Env,
    BrowserStore,
    Anonymous,
}

impl fmt::Display for CookieOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CookieOrigin::Flag => "--cookie",
            CookieOrigin::File => "cookie-file",
            CookieOrigin::Env => COOKIE_ENV,
            CookieOrigin::BrowserStore => "chrome-cookie",
            CookieOrigin::Anonymous => "anonymous",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    pub cookie: Option<String>,
    pub cookie_file: Option<PathBuf>,
}

/// Resolve the `Cookie` header value, if any.
pub fn resolve_cookie<E>(
    opts: &CookieOptions,
    env: E,
    platform: Platform,
    store: &dyn CookieSource,
) -> Result<(Option<String>, CookieOrigin)>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(cookie) = opts.cookie.as_deref().filter(|c| !c.trim().is_empty()) {
        return Ok((Some(cookie.trim().to_string()), CookieOrigin::Flag));
    }
    if let Some(path) = &opts.cookie_file {
        return Ok((Some(load_cookie_file(path)?), CookieOrigin::File));
    }
    if let Some(cookie) = env(COOKIE_ENV).filter(|c| !c.trim().is_empty()) {
        return Ok((Some(cookie.trim().to_string()), CookieOrigin::Env));
    }
    if platform.supports_store_extraction() {
        match browser_cookie_header(store) {
            Ok(header) => return Ok((Some(header), CookieOrigin::BrowserStore)),
            Err(e) => warn!("Chrome cookie extraction failed: {e}"),
        }
    }
    Ok((None, CookieOrigin::Anonymous))
}

/// All linux.do cookies from the browser store as one header value.
pub fn browser_cookie_header(store: &dyn CookieSource) -> Result<String> {
    let cookies = store.read_cookies(&CookieQuery::for_hosts([COOKIE_DOMAIN]))?;
    if cookies.is_empty() {
        return Err(Error::credentials_unavailable(format!(
            "no {COOKIE_DOMAIN} cookies in the Chrome store"
        )));
    }
    Ok(cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; "))
}

pub fn load_cookie_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).path_context(path)?;
    parse_cookie_file(&content)
        .map_err(|reason| Error::InvalidInput(format!("{reason}: {}", path.display())))
}

/// Netscape cookie jar or a raw `Cookie:` header.
///
/// Jar lines have 7 tab-separated fields; `#HttpOnly_` lines are cookies,
/// other `#` lines are comments.
pub fn parse_cookie_file(content: &str) -> std::result::Result<String, &'static str> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return Err("cookie file is empty");
    }

    let mut pairs = Vec::new();
    for line in &lines {
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.starts_with('#') => continue,
            None => line,
        };
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() >= 7 {
            let name = fields[5].trim();
            if !name.is_empty() {
                pairs.push(format!("{name}={}", fields[6].trim()));
            }
        }
    }
    if !pairs.is_empty() {
        return Ok(pairs.join("; "));
    }

    let raw = lines
        .iter()
        .filter(|l| !l.starts_with('#'))
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let raw = raw.trim();
    let raw = match raw.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("cookie:") => raw[7..].trim(),
        _ => raw,
    };
    let valid = Cookie::split_parse(raw)
        .filter_map(|c| c.ok())
        .any(|c| !c.name().is_empty());
    if !valid {
        return Err("cookie file content is not a cookie jar or a name=value header");
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::browser::StoredCookie;
    use std::cell::Cell;

    struct FakeStore {
        cookies: Vec<StoredCookie>,
        calls: Cell<usize>,
    }

    impl CookieSource for FakeStore {
        fn read_cookies(&self, _query: &CookieQuery) -> Result<Vec<StoredCookie>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.cookies.clone())
        }
    }

    fn store(cookies: &[(&str, &str)]) -> FakeStore {
        FakeStore {
            cookies: cookies
                .iter()
                .map(|(n, v)| StoredCookie {
                    host_key: ".linux.do".into(),
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            calls: Cell::new(0),
        }
    }

    #[test]
    fn test_netscape_jar() {
        let jar = "# Netscape HTTP Cookie File\n\
                   .linux.do\tTRUE\t/\tTRUE\t0\t_t\tabc\n\
                   #HttpOnly_.linux.do\tTRUE\t/\tTRUE\t0\t_forum_session\txyz\n";
        assert_eq!(parse_cookie_file(jar).unwrap(), "_t=abc; _forum_session=xyz");
    }

    #[test]
    fn test_raw_header() {
        assert_eq!(
            parse_cookie_file("Cookie: _t=abc; cf_clearance=1\n").unwrap(),
            "_t=abc; cf_clearance=1"
        );
        assert_eq!(parse_cookie_file("_t=abc").unwrap(), "_t=abc");
    }

    #[test]
    fn test_invalid_files() {
        assert!(parse_cookie_file(" \n\n").is_err());
        assert!(parse_cookie_file("just some text").is_err());
    }

    #[test]
    fn test_flag_wins_and_store_untouched() {
        let s = store(&[("_t", "store")]);
        let opts = CookieOptions {
            cookie: Some("_t=flag".into()),
            cookie_file: None,
        };
        let (cookie, origin) =
            resolve_cookie(&opts, |_| Some("_t=env".into()), Platform::MacOs, &s).unwrap();
        assert_eq!(cookie.as_deref(), Some("_t=flag"));
        assert_eq!(origin, CookieOrigin::Flag);
        assert_eq!(s.calls.get(), 0);
    }

    #[test]
    fn test_env_then_store_then_anonymous() {
        let s = store(&[("_t", "a"), ("cf_clearance", "b")]);
        let opts = CookieOptions::default();

        let (cookie, origin) =
            resolve_cookie(&opts, |_| Some("_t=env".into()), Platform::MacOs, &s).unwrap();
        assert_eq!((cookie.as_deref(), origin), (Some("_t=env"), CookieOrigin::Env));

        let (cookie, origin) = resolve_cookie(&opts, |_| None, Platform::MacOs, &s).unwrap();
        assert_eq!(cookie.as_deref(), Some("_t=a; cf_clearance=b"));
        assert_eq!(origin, CookieOrigin::BrowserStore);

        let (cookie, origin) = resolve_cookie(&opts, |_| None, Platform::Linux, &s).unwrap();
        assert_eq!((cookie, origin), (None, CookieOrigin::Anonymous));
        assert_eq!(s.calls.get(), 1);
    }

    #[test]
    fn test_empty_store_is_anonymous() {
        let s = store(&[]);
        let (cookie, origin) =
            resolve_cookie(&CookieOptions::default(), |_| None, Platform::MacOs, &s).unwrap();
        assert_eq!((cookie, origin), (None, CookieOrigin::Anonymous));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let opts = CookieOptions {
            cookie: None,
            cookie_file: Some(PathBuf::from("/nonexistent/cookies.txt")),
        };
        let err = resolve_cookie(&opts, |_| None, Platform::Linux, &store(&[])).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
