// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resilient request client for the REST API.
//!
//! Every call carries the current access token. An authorization failure
//! triggers one coordinated token refresh (shared by all callers that failed
//! with the same token) and a single replay; a second failure is surfaced.

mod client;
mod endpoints;
mod http;
mod refresh;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{decide, ApiClient, Attempt, Decision};
pub use endpoints::{CompanyCreate, LoginRequest, RegisterRequest};
pub use http::{ApiRequest, ApiResponse, HttpError, HttpExchange, HttpResult, ReqwestExchange};
pub use refresh::RefreshGuard;

use reqwest::StatusCode;

/// Errors surfaced by the request client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The replayed call was rejected again with the fresh token.
    #[error("unauthorized\n  hint: your account may lack access to this resource")]
    Unauthorized,

    /// The refresh token is missing or was rejected.
    #[error("session expired\n  hint: run 'remind login' to sign in again")]
    SessionInvalid,

    #[error("server returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rmd_core::StorageError),

    #[error("no company selected\n  hint: run 'remind company use <id>'")]
    NoTenant,
}

impl ApiError {
    /// True for errors that end the session rather than a single call.
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, ApiError::SessionInvalid)
    }
}

/// Result type for request client operations.
pub type ApiResult<T> = Result<T, ApiError>;
