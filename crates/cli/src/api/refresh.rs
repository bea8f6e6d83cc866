// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight token refresh.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use rmd_core::CredentialPair;
use tokio::sync::Mutex;

use super::{ApiError, ApiResult};
use crate::session::SessionStore;

/// Serializes refreshes so that concurrent authorization failures produce a
/// single refresh call.
///
/// A caller passes the access token its request failed with. Once it holds
/// the guard, a session whose token already differs from that stale token was
/// refreshed by another caller, and the new token is reused without another
/// network call.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    in_flight: Mutex<()>,
    refreshes: AtomicU64,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of refresh calls actually performed.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Returns an access token newer than `stale`, refreshing if needed.
    ///
    /// `perform` receives the refresh token and returns the new pair. On any
    /// failure the session is expired and [`ApiError::SessionInvalid`] is
    /// returned.
    pub async fn refresh<F, Fut>(
        &self,
        session: &SessionStore,
        stale: &str,
        perform: F,
    ) -> ApiResult<String>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<CredentialPair>>,
    {
        let _guard = self.in_flight.lock().await;

        let Some(current) = session.credentials() else {
            return Err(ApiError::SessionInvalid);
        };
        if current.access_token != stale {
            tracing::debug!("reusing token from concurrent refresh");
            return Ok(current.access_token);
        }

        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match perform(current.refresh_token).await {
            Ok(pair) => {
                let token = pair.access_token.clone();
                session.replace_credentials(pair)?;
                tracing::info!("access token refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("token refresh failed: {}", e);
                if let Err(e) = session.expire() {
                    tracing::warn!("failed to clear stored credentials: {}", e);
                }
                Err(ApiError::SessionInvalid)
            }
        }
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
