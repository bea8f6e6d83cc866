// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sign-in, sign-out and session status.

use std::io::{BufRead, IsTerminal};

use rmd_core::User;

use super::Context;
use crate::api::{ApiError, HttpExchange, LoginRequest, RegisterRequest};
use crate::error::Result;

/// Sign in with email and password.
pub async fn login<H: HttpExchange>(
    ctx: &Context<H>,
    email: String,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    let user = ctx
        .client
        .login(&LoginRequest {
            email: email.clone(),
            password,
        })
        .await?;
    println!("Signed in as {}", describe_user(user.as_ref(), &email));
    settle_company(ctx).await
}

/// Create an account and sign in.
pub async fn register<H: HttpExchange>(
    ctx: &Context<H>,
    email: String,
    name: String,
    password: Option<String>,
) -> Result<()> {
    let password = resolve_password(password)?;
    let user = ctx
        .client
        .register(&RegisterRequest {
            email: email.clone(),
            password,
            name,
        })
        .await?;
    println!("Registered {}", describe_user(user.as_ref(), &email));
    settle_company(ctx).await
}

/// Forget the stored session.
pub fn logout<H: HttpExchange>(ctx: &Context<H>) -> Result<()> {
    if !ctx.session().state().is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }
    ctx.session().logout()?;
    println!("Signed out.");
    Ok(())
}

/// Show the signed-in user, the active company and the configured servers.
pub async fn status<H: HttpExchange>(ctx: &Context<H>) -> Result<()> {
    println!("API: {}", ctx.config.server.api_url);
    println!("Realtime: {}", ctx.config.server.ws_url);

    if !ctx.session().state().is_authenticated() {
        println!("Session: not signed in");
        return Ok(());
    }

    match ctx.client.me().await {
        Ok(user) => println!("Session: signed in as {}", describe_user(Some(&user), "")),
        Err(ApiError::SessionInvalid) => {
            println!("Session: expired");
            println!();
            println!("Run 'remind login' to sign in again.");
            return Ok(());
        }
        Err(e) => println!("Session: stored, server check failed ({e})"),
    }

    match ctx.session().tenant() {
        Some(tenant) => println!("Company: {} ({})", tenant.display_name(), tenant.id),
        None => println!("Company: none selected"),
    }
    Ok(())
}

/// Reconciles the stored company with the signed-in user's memberships.
///
/// A company snapshot left over from another account is dropped, and a user
/// with exactly one company gets it selected.
async fn settle_company<H: HttpExchange>(ctx: &Context<H>) -> Result<()> {
    let companies = ctx.client.list_companies().await?;
    let session = ctx.session();

    if let Some(current) = session.tenant() {
        if companies.iter().any(|c| c.id == current.id) {
            return Ok(());
        }
        session.clear_tenant()?;
    }

    match companies.as_slice() {
        [only] => {
            session.set_tenant(only.clone())?;
            println!("Active company: {}", only.display_name());
        }
        [] => println!("No companies yet. Run 'remind company create <name>'."),
        _ => println!("Select a company with 'remind company use <id>'."),
    }
    Ok(())
}

pub(crate) fn describe_user(user: Option<&User>, fallback_email: &str) -> String {
    match user {
        Some(user) if user.name.is_empty() => user.email.clone(),
        Some(user) => format!("{} <{}>", user.name, user.email),
        None => fallback_email.to_string(),
    }
}

/// Password from the flag, a no-echo terminal prompt, or piped stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if std::io::stdin().is_terminal() {
        return Ok(rpassword::prompt_password("Password: ")?);
    }
    read_piped_password(std::io::stdin().lock())
}

/// First line of piped input, without its line ending.
pub(crate) fn read_piped_password(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
