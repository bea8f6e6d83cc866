// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::api::ApiError;
use crate::sync::ChannelError;

/// All possible errors that can occur in the remindsync library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not signed in\n  hint: run 'remind login' first")]
    NotLoggedIn,

    #[error("no company selected\n  hint: run 'remind company use <id>' or 'remind company create <name>'")]
    NoCompany,

    #[error("session expired\n  hint: run 'remind login' to sign in again")]
    SessionExpired,

    #[error("realtime channel gave up after {retries} attempts\n  hint: check that the server is reachable and run 'remind watch' again")]
    ChannelExhausted { retries: u32 },

    #[error("company not found: {0}\n  hint: run 'remind company list' to see your companies")]
    CompanyNotFound(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("storage error: {0}")]
    Storage(#[from] rmd_core::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration file and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("invalid {field}: {reason}\n  hint: fix the value in config.toml or the matching REMIND_* variable")]
    Invalid { field: &'static str, reason: String },
}

/// A specialized Result type for remindsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
