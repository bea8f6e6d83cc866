// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the client are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `REMIND_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::REMIND_CONFIG).map(PathBuf::from)
}

/// Returns the value of `REMIND_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    non_empty(vars::REMIND_STATE_DIR).map(PathBuf::from)
}

/// Returns the value of `XDG_STATE_HOME` if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    non_empty(vars::XDG_STATE_HOME).map(PathBuf::from)
}

/// Returns the REST base URL override (`REMIND_API_URL`).
pub fn api_url() -> Option<String> {
    non_empty(vars::REMIND_API_URL)
}

/// Returns the realtime base URL override (`REMIND_WS_URL`).
pub fn ws_url() -> Option<String> {
    non_empty(vars::REMIND_WS_URL)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
