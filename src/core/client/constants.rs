//! Centralized constants for endpoints, headers and defaults.

use std::time::Duration;

pub(crate) const USER_AGENT: &str = concat!("sdwan-rs/", env!("CARGO_PKG_VERSION"));

/// Form login endpoint; a valid login answers 200 with an empty body.
pub(crate) const LOGIN_PATH: &str = "/j_security_check";

/// Returns the XSRF token for the session established by login.
pub(crate) const TOKEN_PATH: &str = "/dataservice/client/token";

/// Prefix of every non-auth API call.
pub(crate) const API_PREFIX: &str = "/dataservice";

pub(crate) const TOKEN_HEADER: &str = "X-XSRF-TOKEN";

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) const DEFAULT_MAX_RETRIES: u32 = 3;
pub(crate) const DEFAULT_BACKOFF_MIN_DELAY: Duration = Duration::from_secs(2);
pub(crate) const DEFAULT_BACKOFF_MAX_DELAY: Duration = Duration::from_secs(60);
pub(crate) const DEFAULT_BACKOFF_DELAY_FACTOR: f64 = 3.0;

/// Wait applied on 429 when the server sends no `Retry-After`.
pub(crate) const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(15);
/// `Retry-After: 0` still waits this long.
pub(crate) const MIN_RETRY_AFTER: Duration = Duration::from_secs(1);
