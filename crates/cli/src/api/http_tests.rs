// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use std::time::Duration;
use yare::parameterized;

#[parameterized(
    plain = { "http://localhost:8000/api", "reminders", "http://localhost:8000/api/reminders" },
    trailing_slash = { "http://localhost:8000/api/", "reminders", "http://localhost:8000/api/reminders" },
    leading_slash = { "http://localhost:8000/api", "/auth/login", "http://localhost:8000/api/auth/login" },
    both = { "https://example.com/api/", "/auth/me", "https://example.com/api/auth/me" },
)]
fn test_join_url(base: &str, path: &str, expected: &str) {
    assert_eq!(join_url(base, path), expected);
}

#[test]
fn test_url_for_rejects_bad_base() {
    let exchange = ReqwestExchange::new("not a url").unwrap();
    assert!(exchange.url_for("reminders").is_err());
}

#[test]
fn test_with_bearer_leaves_original_untouched() {
    let request = ApiRequest::get("auth/me");
    let authed = request.with_bearer("a1");

    assert!(request.bearer.is_none());
    assert_eq!(authed.bearer.as_deref(), Some("a1"));
    assert_eq!(authed.path, "auth/me");
}

#[test]
fn test_builders_set_method_and_body() {
    let request = ApiRequest::post("auth/login", json!({"email": "a@b.c"}))
        .query(vec![("page".to_string(), "2".to_string())]);

    assert_eq!(request.method, Method::POST);
    assert_eq!(request.body, Some(json!({"email": "a@b.c"})));
    assert_eq!(request.query.len(), 1);
    assert_eq!(ApiRequest::delete("x").method, Method::DELETE);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let exchange = ReqwestExchange::new("http://127.0.0.1:9/api").unwrap();
    let err = exchange.execute(ApiRequest::get("auth/me")).await.unwrap_err();
    assert!(matches!(err, HttpError::Transport(_)));
}

#[tokio::test]
async fn test_stalled_server_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accepts and holds connections without ever answering.
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    let exchange =
        ReqwestExchange::with_timeout(format!("http://{addr}/api"), Duration::from_millis(200))
            .unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        exchange.execute(ApiRequest::post("auth/refresh", json!({"refresh_token": "r0"}))),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, Err(HttpError::Transport(_))));
    server.abort();
}

#[test]
fn test_default_timeouts_are_bounded() {
    assert!(REQUEST_TIMEOUT > CONNECT_TIMEOUT);
    assert!(ReqwestExchange::new("http://localhost:8000/api").is_ok());
}
