// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Isolated config and state directories for one test.
pub struct Home {
    pub temp: TempDir,
}

impl Home {
    pub fn new() -> Self {
        Home {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp.path().join("state")
    }

    /// `remind` pointed at this home and an unreachable server.
    pub fn remind(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("remind");
        cmd.env("REMIND_CONFIG", self.config_path())
            .env("REMIND_STATE_DIR", self.state_dir())
            .env("REMIND_API_URL", "http://127.0.0.1:9/api")
            .env("REMIND_WS_URL", "ws://127.0.0.1:9")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, toml: &str) {
        std::fs::write(self.config_path(), toml).unwrap();
    }

    /// Writes a session file with the given raw JSON object.
    pub fn write_session(&self, json: &str) {
        std::fs::create_dir_all(self.state_dir()).unwrap();
        std::fs::write(self.state_dir().join("session.json"), json).unwrap();
    }
}
