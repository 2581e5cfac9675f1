use std::time::Duration;

use rand::Rng;

use super::constants::{
    DEFAULT_BACKOFF_DELAY_FACTOR, DEFAULT_BACKOFF_MAX_DELAY, DEFAULT_BACKOFF_MIN_DELAY,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_AFTER, MIN_RETRY_AFTER,
};
use crate::core::SdwanError;

/// Configuration for the automatic retry mechanism.
///
/// The same policy drives both the login loop and the request loop, each with
/// its own attempt counter.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// The maximum number of retries to attempt. The total number of attempts will be `max_retries + 1`.
    pub max_retries: u32,
    /// The lower bound of every backoff delay.
    pub backoff_min_delay: Duration,
    /// The upper bound of every backoff delay.
    pub backoff_max_delay: Duration,
    /// The multiplicative factor applied per attempt. Must be at least 1.
    pub backoff_delay_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_min_delay: DEFAULT_BACKOFF_MIN_DELAY,
            backoff_max_delay: DEFAULT_BACKOFF_MAX_DELAY,
            backoff_delay_factor: DEFAULT_BACKOFF_DELAY_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Check the policy invariants.
    ///
    /// # Errors
    /// Returns [`SdwanError::Config`] if the min delay exceeds the max delay or
    /// the factor is below 1 (or not a number).
    pub fn validate(&self) -> Result<(), SdwanError> {
        if self.backoff_min_delay > self.backoff_max_delay {
            return Err(SdwanError::Config(format!(
                "backoff min delay {:?} exceeds max delay {:?}",
                self.backoff_min_delay, self.backoff_max_delay
            )));
        }
        if !(self.backoff_delay_factor >= 1.0) {
            return Err(SdwanError::Config(format!(
                "backoff delay factor must be >= 1, got {}",
                self.backoff_delay_factor
            )));
        }
        Ok(())
    }

    /// The delay to wait before retry number `attempt + 1`, or `None` once
    /// `attempt` has reached `max_retries`.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }
        let jitter = rand::rng().random_range(0.5..1.0);
        Some(self.jittered(attempt, jitter))
    }

    /// `min * factor^attempt`, capped at `max`, then scaled into
    /// `[min, min + jitter * (capped - min)]`.
    pub(crate) fn jittered(&self, attempt: u32, jitter: f64) -> Duration {
        let min = self.backoff_min_delay.as_secs_f64();
        let max = self.backoff_max_delay.as_secs_f64();
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);

        let mut raw = min * self.backoff_delay_factor.powi(exponent);
        if !raw.is_finite() || raw > max {
            raw = max;
        }
        let delay = min + jitter * (raw - min);
        Duration::try_from_secs_f64(delay)
            .unwrap_or(self.backoff_max_delay)
            .clamp(self.backoff_min_delay, self.backoff_max_delay)
    }

    /// Sleep before the next attempt.
    ///
    /// Returns `false` without sleeping when retries are exhausted. Only the
    /// calling task is suspended.
    pub async fn backoff(&self, attempt: u32) -> bool {
        self.backoff_with(attempt, |_| {}).await
    }

    /// [`backoff`](Self::backoff), reporting the chosen delay before sleeping.
    pub(crate) async fn backoff_with(&self, attempt: u32, on_delay: impl FnOnce(Duration)) -> bool {
        tracing::debug!(attempt, max_retries = self.max_retries, "backoff");
        match self.delay_for(attempt) {
            Some(delay) => {
                on_delay(delay);
                tracing::trace!(?delay, "sleeping before retry");
                tokio::time::sleep(delay).await;
                true
            }
            None => false,
        }
    }
}

/// Wait demanded by a 429 response.
///
/// `"0"` waits one second, a missing header waits the default, a number of
/// seconds (fractions allowed) waits exactly that. Values that are not a number
/// of seconds, such as HTTP dates, fall back to the default.
pub(crate) fn retry_after(header: Option<&str>) -> Duration {
    let Some(value) = header.map(str::trim) else {
        return DEFAULT_RETRY_AFTER;
    };
    match value.parse::<f64>() {
        Ok(secs) if secs == 0.0 => MIN_RETRY_AFTER,
        Ok(secs) => Duration::try_from_secs_f64(secs).unwrap_or(DEFAULT_RETRY_AFTER),
        Err(_) => DEFAULT_RETRY_AFTER,
    }
}
