use serde_json::{Map, Value};

static EMPTY_LIST: Vec<Value> = Vec::new();

/// Lookups over `serde_json::Value` that never fail.
///
/// A missing key or a value of the wrong type yields the safe default:
/// `None`, an empty string, zero, or an empty slice.
pub trait ValueExt {
    /// Walk object keys; `None` on the first miss.
    fn at(&self, path: &[&str]) -> Option<&Value>;

    /// String (or number) under `key`, trimmed. Anything else is empty.
    fn text(&self, key: &str) -> String;

    /// Non-negative integer under `key`, also accepting digit strings.
    fn count(&self, key: &str) -> u64;

    /// Signed integer under `key`, when present and integral.
    fn int(&self, key: &str) -> Option<i64>;

    /// Array under `key`, or an empty slice.
    fn list(&self, key: &str) -> &[Value];

    /// Object under `key`.
    fn object(&self, key: &str) -> Option<&Map<String, Value>>;

    /// First non-empty [`text`](ValueExt::text) among `keys`.
    fn first_text(&self, keys: &[&str]) -> String {
        keys.iter()
            .map(|k| self.text(k))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }
}

/// Scalar rendered the way it would appear in a URL or message.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl ValueExt for Value {
    fn at(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |cur, key| cur.as_object()?.get(*key))
    }

    fn text(&self, key: &str) -> String {
        self.get(key).map(scalar_text).unwrap_or_default()
    }

    fn count(&self, key: &str) -> u64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    fn int(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn list(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_LIST.as_slice())
    }

    fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }
}
