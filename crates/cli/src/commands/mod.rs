// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod account;
pub mod company;
pub mod reminders;
pub mod watch;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::sync::Arc;

use rmd_core::{FileStore, Tenant};

use crate::api::{ApiClient, HttpExchange, ReqwestExchange};
use crate::config::{session_path, Config};
use crate::error::{Error, Result};
use crate::session::SessionStore;

/// Everything a command needs: configuration and a client bound to the
/// persisted session.
pub struct Context<H: HttpExchange = ReqwestExchange> {
    pub config: Config,
    pub client: ApiClient<H>,
}

impl Context {
    /// Loads the user configuration and restores the session file.
    pub fn open() -> Result<Self> {
        let config = Config::load_default()?;
        let store = FileStore::open(session_path());
        let session = SessionStore::open(Arc::new(store))?;
        let client = ApiClient::connect(config.server.api_url.clone(), session)?;
        Ok(Context { config, client })
    }
}

impl<H: HttpExchange> Context<H> {
    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }

    /// Fails unless someone is signed in.
    pub fn require_login(&self) -> Result<()> {
        if self.session().state().is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotLoggedIn)
        }
    }

    /// The active company of a signed-in session.
    pub fn require_company(&self) -> Result<Tenant> {
        self.require_login()?;
        self.session().tenant().ok_or(Error::NoCompany)
    }
}
