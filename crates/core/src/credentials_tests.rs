// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn debug_output_redacts_tokens() {
    let pair = CredentialPair::new("secret-access", "secret-refresh");
    let debug = format!("{:?}", pair);
    assert!(!debug.contains("secret-access"));
    assert!(!debug.contains("secret-refresh"));
    assert!(debug.contains("<redacted>"));
}

#[test]
fn token_response_without_user_or_type() {
    let response: TokenResponse =
        serde_json::from_str(r#"{"access_token":"a1","refresh_token":"r1"}"#).unwrap();
    assert_eq!(response.token_type, "bearer");

    let (pair, user) = response.into_parts();
    assert_eq!(pair, CredentialPair::new("a1", "r1"));
    assert!(user.is_none());
}

#[test]
fn token_response_with_user() {
    let raw = r#"{
        "access_token": "a1",
        "refresh_token": "r1",
        "token_type": "bearer",
        "user": {
            "id": "u1",
            "email": "kim@example.com",
            "name": "Kim",
            "is_active": true,
            "created_at": "2026-01-05T09:00:00Z"
        }
    }"#;
    let (_, user) = serde_json::from_str::<TokenResponse>(raw)
        .unwrap()
        .into_parts();
    let user = user.unwrap();
    assert_eq!(user.email, "kim@example.com");
    assert!(user.created_at.is_some());
}
