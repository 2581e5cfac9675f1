//! Parsed response payload with dotted-path access.

use serde_json::Value;

/// A response body as returned by vManage.
///
/// Keeps the raw text next to the parsed JSON. Bodies that are empty or not
/// valid JSON parse to [`Value::Null`], so path lookups simply return `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Res {
    raw: String,
    json: Value,
}

impl Res {
    /// Parse a raw body.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let json = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Self { raw, json }
    }

    /// The raw body text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed JSON document.
    pub fn json(&self) -> &Value {
        &self.json
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }

    /// Look up a value by dotted path, e.g. `"data.0.deviceId"`.
    ///
    /// Segments address object keys; on arrays a segment must be an index.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.json, path)
    }

    /// Like [`Res::get`] but only returns string values.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// The application error code at `error.code`, if it is a non-empty string.
    ///
    /// vManage reports codes as strings; any other JSON type is not a code.
    pub(crate) fn error_code(&self) -> Option<String> {
        self.get_str("error.code")
            .filter(|code| !code.is_empty())
            .map(str::to_string)
    }
}

impl Default for Res {
    fn default() -> Self {
        Self::parse(String::new())
    }
}

pub(crate) fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
