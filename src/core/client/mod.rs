//! Public client surface + builder.
//! Internals are split into `auth` (login/token), `session` (token slot and
//! login gate), `execute` (retry loop), `retry` (policy + backoff), `events`
//! (logging) and `constants` (endpoints + defaults).

mod auth;
mod constants;
mod events;
mod execute;
mod retry;
mod session;

pub use retry::RetryPolicy;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use constants::{API_PREFIX, DEFAULT_TIMEOUT, LOGIN_PATH, TOKEN_PATH, USER_AGENT};
use reqwest::{Client, Method};
use session::SessionState;
use url::Url;

use crate::core::{Req, Res, SdwanError};

/// Async client for the vManage REST API.
///
/// Cloning is cheap; clones share the HTTP connection pool, the cookie store
/// and the session token.
///
/// ```no_run
/// # async fn run() -> Result<(), sdwan_rs::SdwanError> {
/// use sdwan_rs::SdwanClient;
///
/// let client = SdwanClient::builder("https://vmanage.example.com", "admin", "secret")
///     .insecure(true)
///     .max_retries(5)
///     .build()?;
///
/// let devices = client.get("/device").await?;
/// println!("{:?}", devices.get("data.0.host-name"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SdwanClient {
    http: Client,
    base: Url,
    login_url: Url,
    token_url: Url,

    username: String,
    password: String,
    insecure: bool,

    retry: RetryPolicy,
    session: Arc<SessionState>,
}

impl fmt::Debug for SdwanClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdwanClient")
            .field("base", &self.base.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SdwanClient {
    /// Create a new builder for the vManage at `url` (e.g. `https://10.0.0.1:8443`).
    pub fn builder(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> SdwanClientBuilder {
        SdwanClientBuilder::new(url, username, password)
    }

    /// Create a client with default settings.
    ///
    /// # Errors
    /// Returns an error if the URL does not parse or the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> Result<Self, SdwanError> {
        Self::builder(url, username, password)
            .insecure(insecure)
            .build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// A request for `path` relative to the base URL, outside `/dataservice`.
    pub fn new_req(&self, method: Method, path: impl Into<String>) -> Req {
        Req::new(method, path)
    }

    /// A request for `path` under `/dataservice`.
    pub fn api_req(&self, method: Method, path: &str) -> Req {
        Req::new(method, format!("{API_PREFIX}{path}"))
    }

    /* -------- verb helpers, all under /dataservice -------- */

    /// GET `/dataservice{path}`.
    ///
    /// # Errors
    /// See [`SdwanClient::execute`].
    pub async fn get(&self, path: &str) -> Result<Res, SdwanError> {
        self.execute(self.api_req(Method::GET, path)).await
    }

    /// DELETE `/dataservice{path}` without a body.
    ///
    /// # Errors
    /// See [`SdwanClient::execute`].
    pub async fn delete(&self, path: &str) -> Result<Res, SdwanError> {
        self.execute(self.api_req(Method::DELETE, path)).await
    }

    /// DELETE `/dataservice{path}` with a payload. [`Body`](crate::Body) builds one.
    ///
    /// # Errors
    /// See [`SdwanClient::execute`].
    pub async fn delete_body(&self, path: &str, data: impl Into<String>) -> Result<Res, SdwanError> {
        self.execute(self.api_req(Method::DELETE, path).body(data.into()))
            .await
    }

    /// POST `/dataservice{path}`. [`Body`](crate::Body) builds the payload.
    ///
    /// # Errors
    /// See [`SdwanClient::execute`].
    pub async fn post(&self, path: &str, data: impl Into<String>) -> Result<Res, SdwanError> {
        self.execute(self.api_req(Method::POST, path).body(data.into()))
            .await
    }

    /// PUT `/dataservice{path}`. [`Body`](crate::Body) builds the payload.
    ///
    /// # Errors
    /// See [`SdwanClient::execute`].
    pub async fn put(&self, path: &str, data: impl Into<String>) -> Result<Res, SdwanError> {
        self.execute(self.api_req(Method::PUT, path).body(data.into()))
            .await
    }

    /// Absolute URL for a path relative to the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, SdwanError> {
        endpoint(&self.base, path)
    }
}

/// Appends `path` to `base` verbatim, keeping any path prefix of the base.
fn endpoint(base: &Url, path: &str) -> Result<Url, SdwanError> {
    let base = base.as_str().trim_end_matches('/');
    let sep = if path.starts_with('/') { "" } else { "/" };
    Ok(Url::parse(&format!("{base}{sep}{path}"))?)
}

/* ----------------------- Builder ----------------------- */

/// Configures an [`SdwanClient`]. Every option has a default.
pub struct SdwanClientBuilder {
    url: String,
    username: String,
    password: String,
    insecure: bool,

    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: RetryPolicy,

    preauth_token: Option<String>,
}

impl SdwanClientBuilder {
    fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            insecure: false,
            user_agent: None,
            timeout: None,
            connect_timeout: None,
            retry: RetryPolicy::default(),
            preauth_token: None,
        }
    }

    /// Accept invalid TLS certificates (self-signed vManage installs). Default: false.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the timeout of each HTTP attempt. Retries get a fresh window. Default: 60 seconds.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Maximum number of retries of one call. Default: 3.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.retry.max_retries = retries;
        self
    }

    /// Minimum delay between two retries. Default: 2 seconds.
    pub fn backoff_min_delay(mut self, dur: Duration) -> Self {
        self.retry.backoff_min_delay = dur;
        self
    }

    /// Maximum delay between two retries. Default: 60 seconds.
    pub fn backoff_max_delay(mut self, dur: Duration) -> Self {
        self.retry.backoff_max_delay = dur;
        self
    }

    /// Backoff delay factor. Default: 3.
    pub fn backoff_delay_factor(mut self, factor: f64) -> Self {
        self.retry.backoff_delay_factor = factor;
        self
    }

    /// Replace the whole retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    #[doc(hidden)]
    /// Start with a token already held, skipping the login exchange.
    pub fn _preauth(mut self, token: impl Into<String>) -> Self {
        self.preauth_token = Some(token.into());
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns [`SdwanError::Url`] for an unparsable URL, [`SdwanError::Config`]
    /// for an inconsistent retry policy, and [`SdwanError::Http`] if the HTTP
    /// client cannot be created.
    pub fn build(self) -> Result<SdwanClient, SdwanError> {
        self.retry.validate()?;

        let base = Url::parse(&self.url)?;
        let login_url = endpoint(&base, LOGIN_PATH)?;
        let token_url = endpoint(&base, TOKEN_PATH)?;

        let mut httpb = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
            .cookie_store(true)
            .danger_accept_invalid_certs(self.insecure)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));

        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }

        let http = httpb.build()?;

        let session = match self.preauth_token {
            Some(token) => SessionState::with_token(token),
            None => SessionState::default(),
        };

        Ok(SdwanClient {
            http,
            base,
            login_url,
            token_url,
            username: self.username,
            password: self.password,
            insecure: self.insecure,
            retry: self.retry,
            session: Arc::new(session),
        })
    }
}
