//! Chainable JSON body builder for POST/PUT/DELETE payloads.

use serde::Serialize;
use serde_json::{Map, Value};

/// Builds a JSON request body by setting values at dotted paths.
///
/// ```
/// use sdwan_rs::Body;
///
/// let body = Body::new()
///     .set("name", "site-100")
///     .set("definition.sequences", Vec::<String>::new());
/// assert_eq!(body.as_value()["name"], "site-100");
/// assert!(body.as_value()["definition"]["sequences"].is_array());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    value: Value,
}

impl Default for Body {
    fn default() -> Self {
        Self::new()
    }
}

impl Body {
    pub fn new() -> Self {
        Self {
            value: Value::Object(Map::new()),
        }
    }

    /// Set `value` at `path`, creating intermediate objects as needed.
    ///
    /// A value that cannot be serialized is stored as `null`. Existing
    /// non-object nodes along the path are replaced by objects.
    pub fn set(mut self, path: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        insert(&mut self.value, path, value);
        self
    }

    /// Set a pre-serialized JSON fragment at `path`.
    ///
    /// Fragments that do not parse are stored as a JSON string.
    pub fn set_raw(mut self, path: &str, raw: &str) -> Self {
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        insert(&mut self.value, path, value);
        self
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value.to_string()
    }
}

impl From<Body> for String {
    fn from(body: Body) -> Self {
        body.into_string()
    }
}

fn insert(root: &mut Value, path: &str, value: Value) {
    let mut node = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
