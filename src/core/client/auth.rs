//! Session login and XSRF token acquisition.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::HeaderValue;

use super::events::{RetryReason, Transition, emit};
use crate::core::SdwanError;
use crate::core::error::{AuthError, AuthStage};

impl super::SdwanClient {
    /// Log in unless a token is already held.
    ///
    /// Concurrent callers share a single login: whoever arrives while a login
    /// is running waits for it and gets its token or its error.
    ///
    /// # Errors
    /// Returns [`SdwanError::Auth`] if the login exchange fails.
    pub async fn ensure_authenticated(&self) -> Result<(), SdwanError> {
        self.ensure_token().await.map(drop)
    }

    /// Like [`ensure_authenticated`](Self::ensure_authenticated), returning the
    /// token the session holds once it succeeds.
    #[tracing::instrument(skip(self), fields(url = %self.base), err)]
    pub(crate) async fn ensure_token(&self) -> Result<String, SdwanError> {
        Ok(self.session.ensure(|| self.login()).await?)
    }

    /// The token attached to API calls, if authenticated.
    pub async fn current_token(&self) -> Option<String> {
        self.session.token().await
    }

    /// Drop the held token so the next call logs in again.
    ///
    /// The client never does this on its own: a session that vManage
    /// invalidated keeps failing until the caller invalidates it here.
    pub async fn invalidate_token(&self) {
        self.session.clear_token().await;
    }

    /// Run the login exchange and return the fresh token.
    ///
    /// A 200 with a non-empty body is vManage rejecting the credentials (it
    /// serves the login page again); that case is retried with backoff. Every
    /// other failure is final.
    async fn login(&self) -> Result<String, AuthError> {
        let mut attempt = 0;
        loop {
            emit(&Transition::Sending {
                method: &Method::POST,
                url: self.login_url.as_str(),
                attempt,
                payload: None,
            });
            let resp = self
                .http
                .post(self.login_url.clone())
                .form(&[
                    ("j_username", self.username.as_str()),
                    ("j_password", self.password.as_str()),
                ])
                .send()
                .await
                .map_err(|e| transport(AuthStage::Login, e))?;

            let status = resp.status().as_u16();
            emit(&Transition::Received {
                status,
                payload: None,
            });
            if status != 200 {
                tracing::error!(status, "authentication failed");
                return Err(AuthError::Rejected {
                    stage: AuthStage::Login,
                    status,
                });
            }

            let body = resp
                .bytes()
                .await
                .map_err(|e| transport(AuthStage::Login, e))?;
            if !body.is_empty() {
                let waited = self
                    .retry
                    .backoff_with(attempt, |delay| {
                        emit(&Transition::Retrying {
                            reason: RetryReason::InvalidCredentials,
                            attempt,
                            delay,
                            detail: "login answered with a non-empty body",
                        });
                    })
                    .await;
                if waited {
                    attempt += 1;
                    continue;
                }
                emit(&Transition::GaveUp {
                    reason: RetryReason::InvalidCredentials,
                    attempt,
                    detail: "invalid credentials",
                });
                return Err(AuthError::InvalidCredentials);
            }

            let token = self.fetch_token().await?;
            emit(&Transition::Authenticated);
            return Ok(token);
        }
    }

    async fn fetch_token(&self) -> Result<String, AuthError> {
        emit(&Transition::Sending {
            method: &Method::GET,
            url: self.token_url.as_str(),
            attempt: 0,
            payload: None,
        });
        let resp = self
            .http
            .get(self.token_url.clone())
            .send()
            .await
            .map_err(|e| transport(AuthStage::Token, e))?;

        let status = resp.status().as_u16();
        emit(&Transition::Received {
            status,
            payload: None,
        });
        if status != 200 {
            tracing::error!(status, "token retrieval failed");
            return Err(AuthError::Rejected {
                stage: AuthStage::Token,
                status,
            });
        }

        let token = resp
            .text()
            .await
            .map_err(|e| transport(AuthStage::Token, e))?;
        if token.is_empty() {
            tracing::error!("token retrieval failed: no token in payload");
            return Err(AuthError::EmptyToken);
        }
        if HeaderValue::from_str(&token).is_err() {
            tracing::error!("token retrieval failed: token is not a valid header value");
            return Err(AuthError::InvalidToken);
        }
        Ok(token)
    }
}

fn transport(stage: AuthStage, source: reqwest::Error) -> AuthError {
    tracing::error!(%stage, error = %source, "authentication transport error");
    AuthError::Transport {
        stage,
        source: Arc::new(source),
    }
}
