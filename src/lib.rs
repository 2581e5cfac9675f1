//! sdwan-rs: resilient async client for the Cisco SD-WAN vManage REST API.
//!
//! The client logs in lazily on the first call, caches the session's XSRF
//! token, and retries connection failures, timeouts, 408/5xx responses and
//! rate limiting (429, honoring `Retry-After`) within a bounded budget.
//!
//! ```no_run
//! # async fn run() -> Result<(), sdwan_rs::SdwanError> {
//! use sdwan_rs::{Body, SdwanClient};
//!
//! let client = SdwanClient::new("https://10.0.0.1:8443", "admin", "secret", true)?;
//! let res = client.get("/device").await?;
//! for device in res.get("data").and_then(|d| d.as_array()).into_iter().flatten() {
//!     println!("{}", device["host-name"]);
//! }
//!
//! let body = Body::new().set("name", "branch-100").set("description", "branch site");
//! client.post("/template/policy/list/site", body).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use crate::core::{
    AuthError, AuthStage, Body, Req, Res, RetryPolicy, SdwanClient, SdwanClientBuilder,
    SdwanError,
};

/// Re-exported so callers can build [`Req`]s and cancel them without extra dependencies.
pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;

/// Install a `tracing` subscriber driven by `RUST_LOG`.
///
/// Dev convenience for examples and tests; does nothing if a subscriber is
/// already installed.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
