//! Log side channel for the request and login loops.
//!
//! The loops report what happened as a [`Transition`]; this module alone
//! decides how it is written to `tracing`.

use std::time::Duration;

use reqwest::Method;

/// Why an attempt is going to be repeated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RetryReason {
    Transport,
    Timeout,
    BodyRead,
    RateLimited,
    Status(u16),
    InvalidCredentials,
}

#[derive(Debug)]
pub(crate) enum Transition<'a> {
    Sending {
        method: &'a Method,
        url: &'a str,
        attempt: u32,
        payload: Option<&'a [u8]>,
    },
    Received {
        status: u16,
        payload: Option<&'a str>,
    },
    Retrying {
        reason: RetryReason,
        attempt: u32,
        delay: Duration,
        detail: &'a str,
    },
    GaveUp {
        reason: RetryReason,
        attempt: u32,
        detail: &'a str,
    },
    Failed {
        detail: &'a str,
    },
    Cancelled,
    Succeeded,
    Authenticated,
}

pub(crate) fn emit(transition: &Transition<'_>) {
    match transition {
        Transition::Sending {
            method,
            url,
            attempt,
            payload: Some(payload),
        } => tracing::debug!(
            %method,
            url,
            attempt,
            payload = %String::from_utf8_lossy(payload),
            "HTTP request"
        ),
        Transition::Sending {
            method,
            url,
            attempt,
            payload: None,
        } => tracing::debug!(%method, url, attempt, "HTTP request"),
        Transition::Received {
            status,
            payload: Some(payload),
        } => tracing::debug!(status, payload, "HTTP response"),
        Transition::Received {
            status,
            payload: None,
        } => tracing::debug!(status, "HTTP response"),
        Transition::Retrying {
            reason: RetryReason::RateLimited,
            attempt,
            delay,
            ..
        } => tracing::warn!(
            attempt,
            wait_secs = delay.as_secs_f64(),
            "HTTP request rate limited"
        ),
        Transition::Retrying {
            reason,
            attempt,
            delay,
            detail,
        } => tracing::error!(?reason, attempt, ?delay, detail, "HTTP request failed, retrying"),
        Transition::GaveUp {
            reason,
            attempt,
            detail,
        } => tracing::error!(?reason, attempt, detail, "retries exhausted"),
        Transition::Failed { detail } => tracing::error!(detail, "HTTP request failed"),
        Transition::Cancelled => tracing::debug!("request cancelled"),
        Transition::Succeeded => tracing::trace!("request done"),
        Transition::Authenticated => tracing::debug!("authentication successful"),
    }
}
