//! Token slot and single-flight authentication gate.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock};

use crate::core::error::AuthError;

/// Outcome of the most recent login flow, recorded under the gate.
#[derive(Debug, Default)]
struct Flight {
    failure: Option<AuthError>,
}

/// Shared session state: the current token and the gate serializing logins.
///
/// The token is written only while the gate is held.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    token: RwLock<Option<String>>,
    gate: Mutex<Flight>,
    // Number of completed login flows; bumped under the gate.
    flights: AtomicU64,
}

impl SessionState {
    pub(crate) fn with_token(token: String) -> Self {
        Self {
            token: RwLock::new(Some(token)),
            ..Self::default()
        }
    }

    pub(crate) async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub(crate) async fn set_token(&self, token: String) {
        let _gate = self.gate.lock().await;
        *self.token.write().await = Some(token);
    }

    pub(crate) async fn clear_token(&self) {
        let _gate = self.gate.lock().await;
        *self.token.write().await = None;
    }

    /// Return the current token, running `login` if there is none.
    ///
    /// Only one `login` runs at a time. A caller that queued on the gate while
    /// another caller's login was running takes that login's outcome instead
    /// of starting a second one.
    pub(crate) async fn ensure<F, Fut>(&self, login: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, AuthError>>,
    {
        // Fast path: a token is already held.
        if let Some(token) = self.token().await {
            return Ok(token);
        }

        let seen = self.flights.load(Ordering::Acquire);
        let mut flight = self.gate.lock().await;

        // Double-check: another task may have logged in while this one was waiting.
        if let Some(token) = self.token().await {
            return Ok(token);
        }
        if self.flights.load(Ordering::Acquire) != seen
            && let Some(failure) = &flight.failure
        {
            return Err(failure.clone());
        }

        let outcome = login().await;
        match &outcome {
            Ok(token) => {
                *self.token.write().await = Some(token.clone());
                flight.failure = None;
            }
            Err(e) => flight.failure = Some(e.clone()),
        }
        self.flights.fetch_add(1, Ordering::Release);
        outcome
    }
}
