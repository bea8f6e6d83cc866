// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session store: the credential pair, the active company and the signed-in
//! user.
//!
//! The store is the single owner of the credential pair. Every mutation is
//! persisted through a [`KeyValueStore`] and then published on a
//! [`tokio::sync::watch`] channel, which the lifecycle coordinator and the
//! request client observe. Tokens are always written and removed together.

use std::sync::Arc;

use rmd_core::storage::keys;
use rmd_core::{CredentialPair, KeyValueStore, MemoryStore, StorageResult, Tenant, User};
use tokio::sync::watch;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user signed out.
    LoggedOut,
    /// The refresh token was rejected; the user must sign in again.
    Expired,
}

/// Snapshot of the session published to observers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub credentials: Option<CredentialPair>,
    pub tenant: Option<Tenant>,
    pub user: Option<User>,
    pub ended: Option<SessionEnd>,
}

impl SessionState {
    /// True when a credential pair is present.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// `(company id, access token)` when both are present.
    ///
    /// This is the identity of the realtime connection; a change in either
    /// part invalidates the open socket.
    pub fn channel_identity(&self) -> Option<(String, String)> {
        match (&self.tenant, &self.credentials) {
            (Some(tenant), Some(creds)) => Some((tenant.id.clone(), creds.access_token.clone())),
            _ => None,
        }
    }
}

/// Shared handle to the session. Cloning is cheap.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Restores the session persisted in `storage`.
    ///
    /// A store holding only one of the two tokens is treated as signed out and
    /// the stray token is removed. A company snapshot that cannot be decoded
    /// is dropped.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> StorageResult<Self> {
        let access = storage.get(keys::ACCESS_TOKEN)?;
        let refresh = storage.get(keys::REFRESH_TOKEN)?;
        let credentials = match (access, refresh) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            (None, None) => None,
            _ => {
                tracing::warn!("discarding incomplete credential pair");
                storage.remove_all(&[keys::ACCESS_TOKEN, keys::REFRESH_TOKEN])?;
                None
            }
        };

        let tenant = match storage.get(keys::CURRENT_COMPANY)? {
            Some(raw) => match serde_json::from_str::<Tenant>(&raw) {
                Ok(tenant) => Some(tenant),
                Err(e) => {
                    tracing::warn!("ignoring unreadable company snapshot: {}", e);
                    storage.remove(keys::CURRENT_COMPANY)?;
                    None
                }
            },
            None => None,
        };

        let state = SessionState {
            credentials,
            tenant,
            user: None,
            ended: None,
        };
        Ok(Self::with_state(storage, state))
    }

    /// A session that lives only in memory.
    pub fn in_memory() -> Self {
        Self::with_state(Arc::new(MemoryStore::new()), SessionState::default())
    }

    fn with_state(storage: Arc<dyn KeyValueStore>, state: SessionState) -> Self {
        SessionStore {
            inner: Arc::new(Inner {
                storage,
                state: watch::Sender::new(state),
            }),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn credentials(&self) -> Option<CredentialPair> {
        self.inner.state.borrow().credentials.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .credentials
            .as_ref()
            .map(|c| c.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .credentials
            .as_ref()
            .map(|c| c.refresh_token.clone())
    }

    pub fn tenant(&self) -> Option<Tenant> {
        self.inner.state.borrow().tenant.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    /// Stores a fresh credential pair after sign-in.
    pub fn login(&self, credentials: CredentialPair, user: Option<User>) -> StorageResult<()> {
        self.persist_credentials(&credentials)?;
        self.inner.state.send_modify(|state| {
            state.credentials = Some(credentials);
            state.user = user;
            state.ended = None;
        });
        tracing::info!("signed in");
        Ok(())
    }

    /// Replaces both tokens after a refresh.
    pub fn replace_credentials(&self, credentials: CredentialPair) -> StorageResult<()> {
        self.persist_credentials(&credentials)?;
        self.inner.state.send_modify(|state| {
            state.credentials = Some(credentials);
            state.ended = None;
        });
        tracing::debug!("credential pair replaced");
        Ok(())
    }

    /// Clears the credential pair after the refresh token was rejected.
    ///
    /// Observers see the expiry even when the durable store cannot be updated.
    pub fn expire(&self) -> StorageResult<()> {
        self.inner.state.send_modify(|state| {
            state.credentials = None;
            state.user = None;
            state.ended = Some(SessionEnd::Expired);
        });
        tracing::warn!("session expired");
        self.inner
            .storage
            .remove_all(&[keys::ACCESS_TOKEN, keys::REFRESH_TOKEN])
    }

    /// Makes `tenant` the active company.
    pub fn set_tenant(&self, tenant: Tenant) -> StorageResult<()> {
        let snapshot = serde_json::to_string(&tenant)?;
        self.inner.storage.set(keys::CURRENT_COMPANY, &snapshot)?;
        self.inner.state.send_modify(|state| state.tenant = Some(tenant));
        Ok(())
    }

    pub fn clear_tenant(&self) -> StorageResult<()> {
        self.inner.storage.remove(keys::CURRENT_COMPANY)?;
        self.inner.state.send_modify(|state| state.tenant = None);
        Ok(())
    }

    /// Signs out: removes the tokens and the company snapshot.
    pub fn logout(&self) -> StorageResult<()> {
        self.inner.storage.remove_all(&[
            keys::ACCESS_TOKEN,
            keys::REFRESH_TOKEN,
            keys::CURRENT_COMPANY,
        ])?;
        self.inner.state.send_replace(SessionState {
            ended: Some(SessionEnd::LoggedOut),
            ..SessionState::default()
        });
        tracing::info!("signed out");
        Ok(())
    }

    fn persist_credentials(&self, credentials: &CredentialPair) -> StorageResult<()> {
        self.inner.storage.set_all(&[
            (keys::ACCESS_TOKEN, credentials.access_token.as_str()),
            (keys::REFRESH_TOKEN, credentials.refresh_token.as_str()),
        ])
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
