//! Outbound request description, replayable across retries.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio_util::sync::CancellationToken;

/// One logical call against vManage.
///
/// The body is captured once when the request is built and never changes, so
/// every retry sends exactly the same bytes.
#[derive(Clone, Debug)]
pub struct Req {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) body: Option<Arc<[u8]>>,
    pub(crate) log_payload: bool,
    pub(crate) headers: HeaderMap,
    pub(crate) cancel: Option<CancellationToken>,
}

impl Req {
    /// A request for `path`, relative to the client base URL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            log_payload: true,
            headers: HeaderMap::new(),
            cancel: None,
        }
    }

    /// Attach a body. Replaces any previous body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Arc::from(body.into()));
        self
    }

    /// Keep request and response payloads out of the logs.
    pub fn no_log_payload(mut self) -> Self {
        self.log_payload = false;
        self
    }

    /// Add an extra header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Abort the call (including pending retries) once `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The body snapshot, if any.
    pub fn payload(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn logs_payload(&self) -> bool {
        self.log_payload
    }
}
