// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel protocol.
//!
//! The server pushes one JSON object per text frame announcing that some
//! entity collection of the active company changed:
//!
//! ```json
//! {"event": "updated", "entity": "reminder", "id": "8f1c…", "data": {"title": "…"}}
//! ```
//!
//! Envelopes are notifications, not state. `data` is a hint and may be partial
//! or stale; consumers refetch the collection named by `entity`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known entity tags carried in [`ChangeEnvelope::entity`].
pub mod entities {
    pub const REMINDER: &str = "reminder";
    pub const TEMPLATE: &str = "template";
    pub const COMPANY: &str = "company";
}

/// Application close code the server uses when it rejects the channel token.
pub const CLOSE_TOKEN_REJECTED: u16 = 4001;

/// Kind of change announced by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEvent {
    Created,
    Updated,
    Deleted,
    BulkCreated,
}

impl ChangeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEvent::Created => "created",
            ChangeEvent::Updated => "updated",
            ChangeEvent::Deleted => "deleted",
            ChangeEvent::BulkCreated => "bulk_created",
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification pushed over the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    /// What happened.
    pub event: ChangeEvent,
    /// Collection tag of the affected entity (e.g. `"reminder"`).
    pub entity: String,
    /// Identifier of the single affected record, if any.
    #[serde(default)]
    pub id: Option<String>,
    /// Advisory payload. Never the sole source of truth.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ChangeEnvelope {
    /// Creates an envelope without id or payload.
    pub fn new(event: ChangeEvent, entity: impl Into<String>) -> Self {
        ChangeEnvelope {
            event,
            entity: entity.into(),
            id: None,
            data: None,
        }
    }

    /// Sets the affected record id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the advisory payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns true if the envelope concerns the given entity tag.
    pub fn is_for(&self, entity: &str) -> bool {
        self.entity == entity
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an envelope from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
