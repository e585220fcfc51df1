use crate::base::error::{Error, Result};
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// A header map that strictly preserves insertion order.
/// Upstream APIs are sensitive to header order, so requests are built with
/// the exact order a browser would send.
#[derive(Debug, Clone, Default)]
pub struct OrderedHeaderMap {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Insert a header, replacing an existing value in place.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<()> {
        let name_header = HeaderName::from_str(name)
            .map_err(|_| Error::InvalidInput(format!("invalid header name: {name}")))?;
        let value_header = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidInput(format!("invalid value for header {name}")))?;

        // HeaderName is lowercase, so equality is a case-insensitive match.
        if let Some((_, v)) = self.headers.iter_mut().find(|(n, _)| *n == name_header) {
            *v = value_header;
        } else {
            self.headers.push((name_header, value_header));
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        if let Ok(target) = HeaderName::from_str(name) {
            self.headers.retain(|(n, _)| *n != target);
        }
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        let target = HeaderName::from_str(name).ok()?;
        self.headers
            .iter()
            .find(|(n, _)| *n == target)
            .map(|(_, v)| v)
    }

    /// Header value as `&str`, when it is visible ASCII.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.headers.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Copy into a standard `http::HeaderMap`, keeping insertion order.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            map.append(name.clone(), value.clone());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_get() {
        let mut headers = OrderedHeaderMap::new();
        headers.insert("X-Csrf-Token", "abc").unwrap();
        assert_eq!(headers.get_str("x-csrf-token"), Some("abc"));
        assert_eq!(headers.get_str("X-CSRF-TOKEN"), Some("abc"));
    }

    #[test]
    fn test_update_keeps_position() {
        let mut headers = OrderedHeaderMap::new();
        headers.insert("accept", "*/*").unwrap();
        headers.insert("cookie", "a=1").unwrap();
        headers.insert("Accept", "application/json").unwrap();
        assert_eq!(headers.names(), vec!["accept", "cookie"]);
        assert_eq!(headers.get_str("accept"), Some("application/json"));
    }

    #[test]
    fn test_remove_header() {
        let mut headers = OrderedHeaderMap::new();
        headers.insert("Authorization", "Bearer t").unwrap();
        headers.remove("authorization");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut headers = OrderedHeaderMap::new();
        headers.insert("origin", "https://x.com").unwrap();
        headers.insert("accept", "*/*").unwrap();
        headers.insert("user-agent", "test").unwrap();

        let map = headers.to_header_map();
        let names: Vec<_> = map.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["origin", "accept", "user-agent"]);
    }

    #[test]
    fn test_invalid_header_is_input_error() {
        let mut headers = OrderedHeaderMap::new();
        let err = headers.insert("Bad Name", "v").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(headers.insert("cookie", "a=1\nb=2").is_err());
    }
}
