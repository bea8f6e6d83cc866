// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP exchange abstraction.
//!
//! Provides a trait-based request/response layer that enables:
//! - Real HTTP calls through `reqwest` for production
//! - Scripted servers for unit testing the refresh-and-replay logic

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;

/// Error type for HTTP exchange operations.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The base URL and path do not form a valid URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type for HTTP exchange operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// A request relative to the API base URL.
///
/// Requests are plain data so the same request can be replayed after a
/// token refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).json(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns a copy carrying `token` as the bearer credential.
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut request = self.clone();
        request.bearer = Some(token.to_string());
        request
    }
}

/// Raw response: status and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        ApiResponse {
            status,
            body: body.into(),
        }
    }

    /// JSON response with the given status.
    pub fn json(status: StatusCode, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }
}

/// One request/response round trip.
pub trait HttpExchange: Send + Sync + 'static {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = HttpResult<ApiResponse>> + Send + '_>>;
}

/// Upper bound on one whole request, connect through body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on establishing the TCP and TLS connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest`-backed exchange against a fixed base URL.
#[derive(Debug, Clone)]
pub struct ReqwestExchange {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestExchange {
    /// Exchange with [`REQUEST_TIMEOUT`] applied.
    pub fn new(base_url: impl Into<String>) -> HttpResult<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    /// Exchange whose requests fail once `timeout` elapses without a full
    /// response.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        ReqwestExchange {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> HttpResult<url::Url> {
        Ok(url::Url::parse(&join_url(&self.base_url, path))?)
    }
}

/// Joins a base URL and a relative path with exactly one slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl HttpExchange for ReqwestExchange {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = HttpResult<ApiResponse>> + Send + '_>> {
        Box::pin(async move {
            let url = self.url_for(&request.path)?;
            let mut builder = self.client.request(request.method.clone(), url);
            if !request.query.is_empty() {
                builder = builder.query(&request.query);
            }
            if let Some(token) = &request.bearer {
                builder = builder.bearer_auth(token);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;

            tracing::debug!("{} {} -> {}", request.method, request.path, status);
            Ok(ApiResponse::new(status, body.to_vec()))
        })
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
