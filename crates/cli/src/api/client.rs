// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request client with refresh-and-replay.

use std::sync::Arc;

use reqwest::StatusCode;
use rmd_core::{CredentialPair, TokenResponse};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::http::{ApiRequest, ApiResponse, HttpExchange, ReqwestExchange};
use super::refresh::RefreshGuard;
use super::{ApiError, ApiResult};
use crate::session::SessionStore;

const REFRESH_PATH: &str = "auth/refresh";

/// Which send of a request a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Original,
    Replay,
}

/// What to do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the response (success or error status) to the caller.
    Deliver,
    /// Refresh the credential pair, then send the request once more.
    RefreshAndReplay,
    /// Fail with [`ApiError::Unauthorized`].
    Propagate,
}

/// Decision table for a response.
///
/// | status | attempt  | decision         |
/// |--------|----------|------------------|
/// | 401    | original | refresh, replay  |
/// | 401    | replay   | propagate        |
/// | other  | any      | deliver          |
pub fn decide(status: StatusCode, attempt: Attempt) -> Decision {
    match (status, attempt) {
        (StatusCode::UNAUTHORIZED, Attempt::Original) => Decision::RefreshAndReplay,
        (StatusCode::UNAUTHORIZED, Attempt::Replay) => Decision::Propagate,
        _ => Decision::Deliver,
    }
}

/// Shared REST client. Cloning is cheap.
pub struct ApiClient<H: HttpExchange = ReqwestExchange> {
    inner: Arc<ClientInner<H>>,
}

struct ClientInner<H> {
    http: H,
    session: SessionStore,
    refresh: RefreshGuard,
}

impl<H: HttpExchange> Clone for ApiClient<H> {
    fn clone(&self) -> Self {
        ApiClient {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ApiClient<ReqwestExchange> {
    /// Client for the API at `base_url`.
    pub fn connect(base_url: impl Into<String>, session: SessionStore) -> ApiResult<Self> {
        Ok(Self::new(ReqwestExchange::new(base_url)?, session))
    }
}

impl<H: HttpExchange> ApiClient<H> {
    pub fn new(http: H, session: SessionStore) -> Self {
        ApiClient {
            inner: Arc::new(ClientInner {
                http,
                session,
                refresh: RefreshGuard::new(),
            }),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Number of refresh calls performed by this client.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh.refresh_count()
    }

    /// Sends `request` with the current access token.
    ///
    /// A 401 on the first send refreshes the credential pair (once, shared
    /// with concurrent callers) and replays the request with the new token.
    /// A 401 on the replay fails with [`ApiError::Unauthorized`]. Non-2xx
    /// statuses become [`ApiError::Status`].
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let mut bearer = self
            .inner
            .session
            .access_token()
            .ok_or(ApiError::SessionInvalid)?;
        let mut attempt = Attempt::Original;

        loop {
            let response = self
                .inner
                .http
                .execute(request.with_bearer(&bearer))
                .await?;

            match decide(response.status, attempt) {
                Decision::Deliver => return check_status(response),
                Decision::Propagate => {
                    tracing::warn!("{} {} rejected after refresh", request.method, request.path);
                    return Err(ApiError::Unauthorized);
                }
                Decision::RefreshAndReplay => {
                    tracing::debug!("{} {} got 401, refreshing", request.method, request.path);
                    bearer = self.force_refresh(&bearer).await?;
                    attempt = Attempt::Replay;
                }
            }
        }
    }

    /// Sends `request` without credentials. Never refreshes.
    pub async fn send_anonymous(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let response = self.inner.http.execute(request).await?;
        check_status(response)
    }

    /// Sends `request` and decodes a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Returns an access token newer than `stale`, refreshing through the
    /// shared single-flight guard if no other caller already did.
    pub async fn force_refresh(&self, stale: &str) -> ApiResult<String> {
        self.inner
            .refresh
            .refresh(&self.inner.session, stale, |refresh_token| {
                self.request_new_pair(refresh_token)
            })
            .await
    }

    async fn request_new_pair(&self, refresh_token: String) -> ApiResult<CredentialPair> {
        let request = ApiRequest::post(REFRESH_PATH, json!({ "refresh_token": refresh_token }));
        let response = self.send_anonymous(request).await?;
        let tokens: TokenResponse = serde_json::from_slice(&response.body)?;
        Ok(tokens.into_parts().0)
    }
}

/// Maps non-2xx responses to [`ApiError::Status`] using the body's `detail`.
fn check_status(response: ApiResponse) -> ApiResult<ApiResponse> {
    if response.status.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status,
        detail: error_detail(&response),
    })
}

fn error_detail(response: &ApiResponse) -> String {
    let detail = serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| body.get("detail").cloned());
    match detail {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => response
            .status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
