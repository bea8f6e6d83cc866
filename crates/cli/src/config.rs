// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `<config_dir>/remind/config.toml` (or the path
//! in `REMIND_CONFIG`) and includes:
//! - `server`: REST and realtime base URLs
//! - `realtime`: reconnect backoff parameters for the push channel
//!
//! Every field has a default, so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{ConfigError, Result};
use crate::sync::ChannelConfig;

const APP_DIR_NAME: &str = "remind";
const CONFIG_FILE_NAME: &str = "config.toml";
const SESSION_FILE_NAME: &str = "session.json";

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Backend endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// REST base URL, including the `/api` prefix.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Realtime base URL; `/ws/{company}` is appended.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            api_url: default_api_url(),
            ws_url: default_ws_url(),
        }
    }
}

/// Reconnect policy for the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Delay before the first reconnect in milliseconds (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Ceiling for the reconnect delay in milliseconds (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Closures tolerated before the channel gives up (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    5
}

impl Config {
    /// Loads configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(config)
    }

    /// Loads the user configuration, applies environment overrides and
    /// validates the result.
    pub fn load_default() -> Result<Self> {
        let mut config = Config::load(&config_path())?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Applies `REMIND_API_URL` and `REMIND_WS_URL`.
    pub fn apply_env(&mut self) {
        if let Some(url) = env::api_url() {
            self.server.api_url = url;
        }
        if let Some(url) = env::ws_url() {
            self.server.ws_url = url;
        }
    }

    /// Checks URL schemes and backoff parameters.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        check_scheme("server.api_url", &self.server.api_url, &["http", "https"])?;
        check_scheme("server.ws_url", &self.server.ws_url, &["ws", "wss"])?;

        if self.realtime.base_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "realtime.base_delay_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.realtime.max_delay_ms < self.realtime.base_delay_ms {
            return Err(ConfigError::Invalid {
                field: "realtime.max_delay_ms",
                reason: format!(
                    "must be at least base_delay_ms ({})",
                    self.realtime.base_delay_ms
                ),
            });
        }
        Ok(())
    }

    /// Builds the channel manager configuration.
    pub fn channel_config(&self) -> std::result::Result<ChannelConfig, ConfigError> {
        let url = url::Url::parse(&self.server.ws_url).map_err(|e| ConfigError::Invalid {
            field: "server.ws_url",
            reason: e.to_string(),
        })?;
        Ok(ChannelConfig {
            url,
            base_delay: Duration::from_millis(self.realtime.base_delay_ms),
            max_delay: Duration::from_millis(self.realtime.max_delay_ms),
            max_retries: self.realtime.max_retries,
        })
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn check_scheme(
    field: &'static str,
    raw: &str,
    allowed: &[&str],
) -> std::result::Result<(), ConfigError> {
    let url = url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("'{raw}': {e}"),
    })?;
    if !allowed.contains(&url.scheme()) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("'{raw}' must use one of: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

/// Path of the configuration file.
///
/// `REMIND_CONFIG` wins; otherwise `<config_dir>/remind/config.toml`.
pub fn config_path() -> PathBuf {
    if let Some(path) = env::config_path() {
        return path;
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Directory for the persisted session.
///
/// Priority: `REMIND_STATE_DIR`, `XDG_STATE_HOME/remind`, the platform state
/// directory, then `~/.local/state/remind`.
pub fn state_dir() -> PathBuf {
    if let Some(dir) = env::state_dir() {
        return dir;
    }
    if let Some(xdg) = env::xdg_state_home() {
        return xdg.join(APP_DIR_NAME);
    }
    if let Some(dir) = dirs::state_dir() {
        return dir.join(APP_DIR_NAME);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("state")
        .join(APP_DIR_NAME)
}

/// Path of the session file.
pub fn session_path() -> PathBuf {
    state_dir().join(SESSION_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
