use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::res::Res;

/// The primary error type for all fallible operations in this crate.
///
/// Variants produced after a response was received carry that response, so the
/// payload returned by vManage is never lost; use [`SdwanError::response`] to
/// reach it without matching on the variant.
#[derive(Debug, Error)]
pub enum SdwanError {
    /// The HTTP client could not be built or a request could not be assembled.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed or joined.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The client configuration is inconsistent (e.g. min backoff above max backoff).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Connection-level failure that persisted after all retries.
    #[error("Transport error at {url}: {source}")]
    Transport {
        /// The underlying transport error of the last attempt.
        #[source]
        source: reqwest::Error,
        /// The URL that was being requested.
        url: String,
    },

    /// The per-attempt deadline was exceeded on the last attempt.
    #[error("Request timed out at {url}: {source}")]
    Timeout {
        /// The underlying timeout error of the last attempt.
        #[source]
        source: reqwest::Error,
        /// The URL that was being requested.
        url: String,
    },

    /// The server kept answering `429 Too Many Requests` until retries ran out.
    #[error("Rate limited at {url} (last Retry-After: {retry_after:?})")]
    RateLimited {
        /// The URL that returned 429.
        url: String,
        /// The wait derived from the last `Retry-After` header.
        retry_after: Duration,
        /// The last response payload.
        response: Box<Res>,
    },

    /// The server kept answering 408 or 5xx until retries ran out.
    #[error("HTTP Request failed: StatusCode {status} at {url}")]
    Server {
        /// The last HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
        /// The last response payload.
        response: Box<Res>,
    },

    /// The server returned a non-retryable, unsuccessful HTTP status code.
    #[error("HTTP Request failed: StatusCode {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
        /// The response payload, which usually describes the failure.
        response: Box<Res>,
    },

    /// The request succeeded at the HTTP level but the payload carries `error.code`.
    #[error("JSON error {code}: {}", .response.raw())]
    Api {
        /// The value found at `error.code`.
        code: String,
        /// The full response payload.
        response: Box<Res>,
    },

    /// Authentication against vManage failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The request was cancelled through its cancellation token.
    #[error("request cancelled")]
    Cancelled,
}

impl SdwanError {
    /// The response payload observed before the failure, if any.
    pub fn response(&self) -> Option<&Res> {
        match self {
            SdwanError::RateLimited { response, .. }
            | SdwanError::Server { response, .. }
            | SdwanError::Status { response, .. }
            | SdwanError::Api { response, .. } => Some(response),
            _ => None,
        }
    }

    /// The HTTP status code associated with this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdwanError::RateLimited { .. } => Some(429),
            SdwanError::Server { status, .. } | SdwanError::Status { status, .. } => Some(*status),
            SdwanError::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Which step of the login exchange rejected the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStage {
    /// `POST /j_security_check`
    Login,
    /// `GET /dataservice/client/token`
    Token,
}

impl std::fmt::Display for AuthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStage::Login => f.write_str("login"),
            AuthStage::Token => f.write_str("token retrieval"),
        }
    }
}

/// Authentication failures.
///
/// Cloneable so that a single failed login can be reported to every caller
/// that was waiting on it.
#[derive(Clone, Debug, Error)]
pub enum AuthError {
    /// Login kept answering 200 with a non-empty body.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Login or token endpoint answered with a status other than 200.
    #[error("{stage}, status code: {status}")]
    Rejected {
        /// The step that failed.
        stage: AuthStage,
        /// The HTTP status code received.
        status: u16,
    },

    /// The token endpoint answered 200 with an empty body.
    #[error("no token in payload")]
    EmptyToken,

    /// The token endpoint answered with bytes that cannot go in a header.
    #[error("token is not a valid header value")]
    InvalidToken,

    /// The login exchange could not reach the server.
    #[error("{stage} transport error: {source}")]
    Transport {
        /// The step that failed.
        stage: AuthStage,
        /// The underlying transport error.
        #[source]
        source: Arc<reqwest::Error>,
    },
}
