// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for command tests.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use rmd_core::Tenant;
use serde_json::json;

use super::Context;
use crate::api::test_helpers::{signed_in_session, FakeServer};
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Error;
use crate::session::SessionStore;

/// Context whose client talks to `server` with `session`.
pub fn context(server: &FakeServer, session: SessionStore) -> Context<FakeServer> {
    Context {
        config: Config::default(),
        client: ApiClient::new(server.clone(), session),
    }
}

/// Signed in as `a0`/`r0` with company `c1` selected.
pub fn company_context(server: &FakeServer) -> Context<FakeServer> {
    let session = signed_in_session();
    session.set_tenant(Tenant::new("c1", "Acme")).unwrap();
    context(server, session)
}

/// Routes `companies` to the given `(id, name)` pairs.
pub fn route_companies(server: &FakeServer, companies: &[(&str, &str)]) {
    let body: Vec<_> = companies
        .iter()
        .map(|(id, name)| json!({"id": id, "name": name}))
        .collect();
    server.route("companies", StatusCode::OK, json!(body));
}

#[test]
fn require_login_fails_when_signed_out() {
    let ctx = context(&FakeServer::new("a0"), SessionStore::in_memory());
    assert!(matches!(ctx.require_login(), Err(Error::NotLoggedIn)));
    assert!(matches!(ctx.require_company(), Err(Error::NotLoggedIn)));
}

#[test]
fn require_company_fails_without_tenant() {
    let ctx = context(&FakeServer::new("a0"), signed_in_session());
    assert!(ctx.require_login().is_ok());
    assert!(matches!(ctx.require_company(), Err(Error::NoCompany)));
}

#[test]
fn require_company_returns_active_tenant() {
    let ctx = company_context(&FakeServer::new("a0"));
    assert_eq!(ctx.require_company().unwrap().id, "c1");
}
