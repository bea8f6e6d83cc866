// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::api::test_helpers::{signed_in_session, FakeServer};
use crate::session::SessionEnd;
use serde_json::Value;
use std::time::Duration;
use yare::parameterized;

fn client(server: &FakeServer) -> ApiClient<FakeServer> {
    ApiClient::new(server.clone(), signed_in_session())
}

fn bearers(server: &FakeServer, path: &str) -> Vec<String> {
    server
        .requests_to(path)
        .into_iter()
        .map(|r| r.bearer.unwrap_or_default())
        .collect()
}

#[parameterized(
    unauthorized_original = { 401, Attempt::Original, Decision::RefreshAndReplay },
    unauthorized_replay = { 401, Attempt::Replay, Decision::Propagate },
    ok_original = { 200, Attempt::Original, Decision::Deliver },
    ok_replay = { 200, Attempt::Replay, Decision::Deliver },
    forbidden = { 403, Attempt::Original, Decision::Deliver },
    server_error = { 500, Attempt::Replay, Decision::Deliver },
)]
fn test_decide(status: u16, attempt: Attempt, expected: Decision) {
    let status = StatusCode::from_u16(status).unwrap();
    assert_eq!(decide(status, attempt), expected);
}

#[tokio::test]
async fn test_request_carries_bearer() {
    let server = FakeServer::new("a0");
    server.route("auth/me", StatusCode::OK, json!({"ok": true}));

    let value: Value = client(&server)
        .get_json(ApiRequest::get("auth/me"))
        .await
        .unwrap();

    assert_eq!(value, json!({"ok": true}));
    assert_eq!(bearers(&server, "auth/me"), vec!["a0"]);
    assert_eq!(server.refresh_calls(), 0);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_replayed_once() {
    let server = FakeServer::new("a0");
    server.route("templates", StatusCode::OK, json!([]));
    server.expire_token();
    let client = client(&server);

    client.send(ApiRequest::get("templates")).await.unwrap();

    assert_eq!(bearers(&server, "templates"), vec!["a0", "a1"]);
    assert_eq!(server.refresh_calls(), 1);
    assert_eq!(client.refresh_count(), 1);
    assert_eq!(client.session().access_token().as_deref(), Some("a1"));
    assert_eq!(client.session().refresh_token().as_deref(), Some("r1"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let server = FakeServer::new("a0");
    server.route("reminders", StatusCode::OK, json!({"items": [], "total": 0}));
    server.route("templates", StatusCode::OK, json!([]));
    server.refresh_delay(Duration::from_millis(100));
    server.expire_token();
    let client = client(&server);

    let (first, second) = tokio::join!(
        client.send(ApiRequest::get("reminders")),
        client.send(ApiRequest::get("templates")),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(server.refresh_calls(), 1);
    assert_eq!(bearers(&server, "reminders"), vec!["a0", "a1"]);
    assert_eq!(bearers(&server, "templates"), vec!["a0", "a1"]);
}

#[tokio::test]
async fn test_replay_rejected_again_is_not_retried() {
    let server = FakeServer::new("a0");
    server.route("auth/me", StatusCode::OK, json!({}));
    server.reject_all();
    let client = client(&server);

    let err = client.send(ApiRequest::get("auth/me")).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(server.refresh_calls(), 1);
    assert_eq!(server.requests_to("auth/me").len(), 2);
    assert!(client.session().state().is_authenticated());
}

#[tokio::test]
async fn test_refresh_failure_invalidates_session() {
    let server = FakeServer::new("a0");
    server.expire_token();
    server.fail_refresh();
    let client = client(&server);

    let err = client.send(ApiRequest::get("auth/me")).await.unwrap_err();

    assert!(err.is_session_invalid());
    assert_eq!(server.requests_to("auth/me").len(), 1);
    let state = client.session().state();
    assert!(state.credentials.is_none());
    assert_eq!(state.ended, Some(SessionEnd::Expired));
}

#[tokio::test]
async fn test_error_status_carries_detail() {
    let server = FakeServer::new("a0");
    server.route(
        "auth/companies",
        StatusCode::BAD_REQUEST,
        json!({"detail": "Company already exists"}),
    );

    let err = client(&server)
        .send(ApiRequest::post("auth/companies", json!({"name": "Acme"})))
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(detail, "Company already exists");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_signed_out_client_sends_nothing() {
    let server = FakeServer::new("a0");
    let client = ApiClient::new(server.clone(), SessionStore::in_memory());

    let err = client.send(ApiRequest::get("auth/me")).await.unwrap_err();

    assert!(err.is_session_invalid());
    assert!(server.requests_to("auth/me").is_empty());
}

#[tokio::test]
async fn test_anonymous_request_never_refreshes() {
    let server = FakeServer::new("a0");
    server.route(
        "auth/login",
        StatusCode::UNAUTHORIZED,
        json!({"detail": "Invalid email or password"}),
    );

    let err = client(&server)
        .send_anonymous(ApiRequest::post("auth/login", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { .. }));
    assert_eq!(server.refresh_calls(), 0);
    assert!(bearers(&server, "auth/login").iter().all(String::is_empty));
}

#[tokio::test]
async fn test_force_refresh_with_outdated_token_reuses_current() {
    let server = FakeServer::new("a0");
    let client = client(&server);

    let token = client.force_refresh("older-token").await.unwrap();

    assert_eq!(token, "a0");
    assert_eq!(server.refresh_calls(), 0);
}
