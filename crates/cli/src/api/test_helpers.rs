// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted REST server for request client tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use rmd_core::CredentialPair;
use serde_json::{json, Value};

use super::http::{ApiRequest, ApiResponse, HttpExchange, HttpResult};
use crate::session::SessionStore;

const PUBLIC_PATHS: &[&str] = &["auth/login", "auth/register", "auth/refresh"];

/// In-process API that validates bearer tokens and rotates them on refresh.
///
/// Refreshed pairs are `a{n}`/`r{n}` where `n` counts refresh calls.
#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    valid_token: String,
    refresh_delay: Duration,
    refresh_fails: bool,
    reject_all: bool,
    routes: HashMap<String, (StatusCode, Value)>,
    requests: Vec<ApiRequest>,
    refreshes: u32,
}

impl FakeServer {
    /// Server that accepts `token` as the current access token.
    pub fn new(token: &str) -> Self {
        let server = FakeServer::default();
        server.state.lock().unwrap().valid_token = token.to_string();
        server
    }

    /// Responds to `path` with `status` and `body`.
    pub fn route(&self, path: &str, status: StatusCode, body: Value) -> &Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), (status, body));
        self
    }

    /// Invalidates the current access token; only a refresh fixes it.
    pub fn expire_token(&self) {
        self.state.lock().unwrap().valid_token.clear();
    }

    /// Delays every refresh response by `delay`.
    pub fn refresh_delay(&self, delay: Duration) {
        self.state.lock().unwrap().refresh_delay = delay;
    }

    /// Rejects refresh tokens.
    pub fn fail_refresh(&self) {
        self.state.lock().unwrap().refresh_fails = true;
    }

    /// Answers 401 to every protected request, even with a fresh token.
    pub fn reject_all(&self) {
        self.state.lock().unwrap().reject_all = true;
    }

    pub fn refresh_calls(&self) -> u32 {
        self.state.lock().unwrap().refreshes
    }

    /// Requests received for `path`, in arrival order.
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    fn handle_refresh(&self) -> (Duration, ApiResponse) {
        let mut state = self.state.lock().unwrap();
        state.refreshes += 1;
        let delay = state.refresh_delay;
        if state.refresh_fails {
            let response = ApiResponse::json(
                StatusCode::UNAUTHORIZED,
                &json!({"detail": "Invalid refresh token"}),
            );
            return (delay, response);
        }
        let n = state.refreshes;
        state.valid_token = format!("a{n}");
        let body = json!({
            "access_token": format!("a{n}"),
            "refresh_token": format!("r{n}"),
            "token_type": "bearer",
        });
        (delay, ApiResponse::json(StatusCode::OK, &body))
    }

    fn handle(&self, request: &ApiRequest) -> ApiResponse {
        let state = self.state.lock().unwrap();
        let public = PUBLIC_PATHS.contains(&request.path.as_str());
        let authorized = !state.reject_all
            && !state.valid_token.is_empty()
            && request.bearer.as_deref() == Some(state.valid_token.as_str());
        if !public && !authorized {
            return ApiResponse::json(
                StatusCode::UNAUTHORIZED,
                &json!({"detail": "Could not validate credentials"}),
            );
        }
        match state.routes.get(&request.path) {
            Some((status, body)) => ApiResponse::json(*status, body),
            None => ApiResponse::json(StatusCode::NOT_FOUND, &json!({"detail": "Not Found"})),
        }
    }
}

impl HttpExchange for FakeServer {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = HttpResult<ApiResponse>> + Send + '_>> {
        Box::pin(async move {
            self.state.lock().unwrap().requests.push(request.clone());
            if request.path == "auth/refresh" {
                let (delay, response) = self.handle_refresh();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                return Ok(response);
            }
            tokio::task::yield_now().await;
            Ok(self.handle(&request))
        })
    }
}

/// Session signed in as `a0`/`r0`.
pub fn signed_in_session() -> SessionStore {
    let session = SessionStore::in_memory();
    session.login(CredentialPair::new("a0", "r0"), None).unwrap();
    session
}
