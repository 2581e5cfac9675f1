//! The retrying request loop.
//!
//! One logical call runs as a small state machine:
//!
//! ```text
//! Sending ──2xx──────────────▶ Done(Ok | Api error)
//!    │ ──fatal───────────────▶ Done(Err)
//!    │ ──retryable, budget───▶ Backoff ──▶ Sending
//!    └ ──retryable, no budget▶ Done(Err, last payload)
//! ```

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue, RETRY_AFTER};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::constants::TOKEN_HEADER;
use super::events::{RetryReason, Transition, emit};
use super::retry::retry_after;
use crate::core::{Req, Res, SdwanError};

enum State {
    Sending,
    Backoff { delay: Duration },
    Done(Result<Res, SdwanError>),
}

/// How a status code is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusClass {
    Success,
    /// 429: wait what the server asks for.
    RateLimited,
    /// 408 and 5xx: wait with jittered backoff.
    Retryable,
    Fatal,
}

pub(crate) fn classify(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::RateLimited,
        408 | 500..=599 => StatusClass::Retryable,
        _ => StatusClass::Fatal,
    }
}

/// The last retryable failure of a call. Becomes the returned error once the
/// retry budget is spent.
enum Failure {
    Transport(reqwest::Error),
    Timeout(reqwest::Error),
    BodyRead(reqwest::Error),
    RateLimited { retry_after: Duration, response: Res },
    Server { status: u16, response: Res },
}

impl Failure {
    fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Failure::Timeout(e)
        } else {
            Failure::Transport(e)
        }
    }

    fn from_read(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Failure::Timeout(e)
        } else {
            Failure::BodyRead(e)
        }
    }

    fn reason(&self) -> RetryReason {
        match self {
            Failure::Transport(_) => RetryReason::Transport,
            Failure::Timeout(_) => RetryReason::Timeout,
            Failure::BodyRead(_) => RetryReason::BodyRead,
            Failure::RateLimited { .. } => RetryReason::RateLimited,
            Failure::Server { status, .. } => RetryReason::Status(*status),
        }
    }

    fn detail(&self) -> String {
        match self {
            Failure::Transport(e) | Failure::Timeout(e) | Failure::BodyRead(e) => e.to_string(),
            Failure::RateLimited { .. } => "StatusCode 429".to_string(),
            Failure::Server { status, .. } => format!("StatusCode {status}"),
        }
    }

    fn into_error(self, url: &Url) -> SdwanError {
        let url = url.to_string();
        match self {
            Failure::Transport(source) | Failure::BodyRead(source) => {
                SdwanError::Transport { source, url }
            }
            Failure::Timeout(source) => SdwanError::Timeout { source, url },
            Failure::RateLimited {
                retry_after,
                response,
            } => SdwanError::RateLimited {
                url,
                retry_after,
                response: Box::new(response),
            },
            Failure::Server { status, response } => SdwanError::Server {
                status,
                url,
                response: Box::new(response),
            },
        }
    }
}

/// What one physical attempt produced.
enum Outcome {
    Success(Res),
    Retry(Failure),
    Fatal(SdwanError),
}

impl super::SdwanClient {
    /// Execute a request: authenticate if needed, send, and retry transient
    /// failures according to the client's [`RetryPolicy`](super::RetryPolicy).
    ///
    /// The path of `req` is relative to the base URL; use
    /// [`SdwanClient::api_req`](super::SdwanClient::api_req) for calls under
    /// `/dataservice`.
    ///
    /// # Errors
    /// Errors that follow a received response carry it; see
    /// [`SdwanError::response`].
    #[tracing::instrument(skip(self, req), fields(method = %req.method, path = %req.path), err)]
    pub async fn execute(&self, req: Req) -> Result<Res, SdwanError> {
        let token = match cancellable(req.cancel.as_ref(), self.ensure_token()).await {
            Some(token) => token?,
            None => {
                emit(&Transition::Cancelled);
                return Err(SdwanError::Cancelled);
            }
        };
        let url = self.endpoint(&req.path)?;

        let mut attempt = 0;
        let mut state = State::Sending;
        loop {
            state = match state {
                State::Sending => self.attempt(&req, &url, &token, attempt).await,
                State::Backoff { delay } => {
                    match cancellable(req.cancel.as_ref(), tokio::time::sleep(delay)).await {
                        Some(()) => {
                            attempt += 1;
                            State::Sending
                        }
                        None => {
                            emit(&Transition::Cancelled);
                            State::Done(Err(SdwanError::Cancelled))
                        }
                    }
                }
                State::Done(result) => return result,
            };
        }
    }

    /// One physical attempt followed by the decision on what comes next.
    async fn attempt(&self, req: &Req, url: &Url, token: &str, attempt: u32) -> State {
        match self.send_once(req, url, token, attempt).await {
            Outcome::Success(res) => match res.error_code() {
                Some(code) => {
                    emit(&Transition::Failed {
                        detail: &format!("JSON error: {}", res.raw()),
                    });
                    State::Done(Err(SdwanError::Api {
                        code,
                        response: Box::new(res),
                    }))
                }
                None => {
                    emit(&Transition::Succeeded);
                    State::Done(Ok(res))
                }
            },
            Outcome::Fatal(err) => {
                match &err {
                    SdwanError::Cancelled => emit(&Transition::Cancelled),
                    other => emit(&Transition::Failed {
                        detail: &other.to_string(),
                    }),
                }
                State::Done(Err(err))
            }
            Outcome::Retry(failure) => {
                let delay = match &failure {
                    Failure::RateLimited { retry_after, .. } => {
                        (attempt < self.retry.max_retries).then_some(*retry_after)
                    }
                    _ => self.retry.delay_for(attempt),
                };
                let detail = failure.detail();
                match delay {
                    Some(delay) => {
                        emit(&Transition::Retrying {
                            reason: failure.reason(),
                            attempt,
                            delay,
                            detail: &detail,
                        });
                        State::Backoff { delay }
                    }
                    None => {
                        emit(&Transition::GaveUp {
                            reason: failure.reason(),
                            attempt,
                            detail: &detail,
                        });
                        State::Done(Err(failure.into_error(url)))
                    }
                }
            }
        }
    }

    async fn send_once(&self, req: &Req, url: &Url, token: &str, attempt: u32) -> Outcome {
        let mut builder = self
            .http
            .request(req.method.clone(), url.clone())
            .headers(req.headers.clone());
        match HeaderValue::from_str(token) {
            Ok(value) => builder = builder.header(TOKEN_HEADER, value),
            Err(e) => {
                return Outcome::Fatal(SdwanError::Config(format!("unusable token: {e}")));
            }
        }
        if let Some(body) = &req.body {
            if !req.headers.contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            // reqwest consumes the body; each attempt gets its own copy of the snapshot.
            builder = builder.body(body.to_vec());
        }

        emit(&Transition::Sending {
            method: &req.method,
            url: url.as_str(),
            attempt,
            payload: req.body.as_deref().filter(|_| req.log_payload),
        });

        let resp = match cancellable(req.cancel.as_ref(), builder.send()).await {
            None => return Outcome::Fatal(SdwanError::Cancelled),
            Some(Err(e)) if e.is_builder() => return Outcome::Fatal(SdwanError::Http(e)),
            Some(Err(e)) => return Outcome::Retry(Failure::from_send(e)),
            Some(Ok(resp)) => resp,
        };

        let status = resp.status().as_u16();
        let wait = retry_after(
            resp.headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        );

        let res = match cancellable(req.cancel.as_ref(), crate::core::net::read_res(resp)).await {
            None => return Outcome::Fatal(SdwanError::Cancelled),
            Some(Err(e)) => return Outcome::Retry(Failure::from_read(e)),
            Some(Ok(res)) => res,
        };
        emit(&Transition::Received {
            status,
            payload: req.log_payload.then(|| res.raw()),
        });

        match classify(status) {
            StatusClass::Success => Outcome::Success(res),
            StatusClass::RateLimited => Outcome::Retry(Failure::RateLimited {
                retry_after: wait,
                response: res,
            }),
            StatusClass::Retryable => Outcome::Retry(Failure::Server {
                status,
                response: res,
            }),
            StatusClass::Fatal => Outcome::Fatal(SdwanError::Status {
                status,
                url: url.to_string(),
                response: Box::new(res),
            }),
        }
    }
}

/// Run `fut` unless `cancel` fires first. `None` means cancelled.
async fn cancellable<F: Future>(cancel: Option<&CancellationToken>, fut: F) -> Option<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}
