use crate::base::error::{Error, Result};
use crate::http::orderedheaders::OrderedHeaderMap;
use url::Url;

/// A GET request fully built before any I/O: URL plus ordered headers.
///
/// Never mutated after dispatch; following a redirect derives a new request
/// with [`FetchRequest::redirect_to`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: Url,
    pub headers: OrderedHeaderMap,
}

impl FetchRequest {
    pub fn new(url: Url, headers: OrderedHeaderMap) -> Self {
        Self { url, headers }
    }

    /// Parse `url` and attach `headers`.
    pub fn get(url: &str, headers: OrderedHeaderMap) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::new(url, headers))
    }

    /// Request for a redirect target. Credentials are dropped when the
    /// host changes.
    pub fn redirect_to(&self, next: Url) -> Self {
        let mut headers = self.headers.clone();
        if next.host_str() != self.url.host_str() {
            headers.remove("cookie");
            headers.remove("authorization");
        }
        Self { url: next, headers }
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

/// Insertion-ordered query parameters.
///
/// Setting an existing key replaces its value without moving it, so
/// overrides never reorder a captured query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query of `url`; a repeated key keeps its first position and last value.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::new();
        for (k, v) in url.query_pairs() {
            params.set(&k, &v);
        }
        params
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut params = Self::new();
        for (k, v) in pairs {
            params.set(k, v);
        }
        params
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.pairs.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn extend(&mut self, overrides: &[(String, String)]) {
        for (k, v) in overrides {
            self.set(k, v);
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace the query of `url` with these parameters, form-encoded.
    pub fn apply_to(&self, url: &mut Url) {
        url.set_query(None);
        if self.pairs.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.iter());
    }
}

/// Parse repeated `KEY=VALUE` overrides.
///
/// The value may contain further `=`; the key is trimmed and must not be
/// empty.
pub fn parse_param_overrides<S: AsRef<str>>(raw: &[S]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::InvalidInput(format!("invalid --param \"{pair}\", expected KEY=VALUE"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "invalid --param \"{pair}\", KEY must not be empty"
                )));
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_overrides() {
        let parsed = parse_param_overrides(&["a=1", " b =x=y", "c="]).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x=y".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_param_override_errors() {
        assert!(matches!(
            parse_param_overrides(&["novalue"]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_param_overrides(&[" =1"]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_query_set_keeps_position() {
        let url = Url::parse("https://x.com/p?a=1&b=2&a=3").unwrap();
        let mut params = QueryParams::from_url(&url);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("3"));
        params.set("a", "9");
        params.set("z", "0");
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "z"]);
    }

    #[test]
    fn test_apply_to_encodes() {
        let mut url = Url::parse("https://x.com/p?old=1").unwrap();
        let params = QueryParams::from_pairs([("ext", "a,b"), ("q", "x y")]);
        params.apply_to(&mut url);
        assert_eq!(url.query(), Some("ext=a%2Cb&q=x+y"));
    }

    #[test]
    fn test_redirect_drops_credentials_across_hosts() {
        let mut headers = OrderedHeaderMap::new();
        headers.insert("cookie", "a=1").unwrap();
        headers.insert("authorization", "Bearer t").unwrap();
        headers.insert("accept", "*/*").unwrap();
        let req = FetchRequest::get("https://x.com/a", headers).unwrap();

        let same = req.redirect_to(Url::parse("https://x.com/b").unwrap());
        assert!(same.headers.get("cookie").is_some());

        let other = req.redirect_to(Url::parse("https://cdn.example/b").unwrap());
        assert!(other.headers.get("cookie").is_none());
        assert!(other.headers.get("authorization").is_none());
        assert_eq!(other.headers.names(), vec!["accept"]);
    }
}
