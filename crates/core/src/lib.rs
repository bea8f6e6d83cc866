// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rmd-core: Shared types for the remind realtime sync layer
//!
//! This crate provides the wire protocol of the realtime channel, the
//! credential and tenant types owned by the session store, the thin domain
//! list types that sync consumers refetch, and durable key-value storage.

pub mod credentials;
pub mod error;
pub mod models;
pub mod protocol;
pub mod storage;
pub mod tenant;

pub use credentials::{CredentialPair, TokenResponse, User};
pub use error::{StorageError, StorageResult};
pub use models::{Reminder, ReminderListResponse, ReminderQuery, Template};
pub use protocol::{ChangeEnvelope, ChangeEvent};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use tenant::Tenant;
