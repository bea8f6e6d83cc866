// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant (company) context.
//!
//! Every reminder belongs to a company; the realtime channel and all list
//! queries are scoped to the active one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The active company/workspace of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub business_number: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Tenant {
    /// Creates a tenant known only by id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Tenant {
            id: id.into(),
            name: name.into(),
            business_number: None,
            owner_id: None,
            created_at: None,
        }
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
