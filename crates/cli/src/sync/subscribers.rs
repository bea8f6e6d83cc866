// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast fan-out of decoded envelopes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use rmd_core::ChangeEnvelope;

type Handler = Arc<dyn Fn(&ChangeEnvelope) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<u64, Handler>,
}

/// Set of registered envelope handlers.
///
/// Delivery is synchronous to whoever is registered when an envelope is
/// published. Handlers are called outside the registry lock, so a handler may
/// subscribe or unsubscribe without deadlocking.
#[derive(Clone, Default)]
pub struct SubscriberSet {
    registry: Arc<Mutex<Registry>>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every published envelope.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEnvelope) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.insert(id, Arc::new(handler));
        Subscription {
            id,
            registry: Some(Arc::downgrade(&self.registry)),
        }
    }

    /// Delivers `envelope` to every current handler.
    pub fn publish(&self, envelope: &ChangeEnvelope) {
        let handlers: Vec<Handler> = self.lock().handlers.values().cloned().collect();
        for handler in handlers {
            handler(envelope);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("handlers", &self.len())
            .finish()
    }
}

/// Handle returned by [`SubscriberSet::subscribe`].
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Option<Weak<Mutex<Registry>>>,
}

impl Subscription {
    /// Removes the handler. Returns false if it was already removed.
    pub fn unsubscribe(&mut self) -> bool {
        let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) else {
            return false;
        };
        let removed = registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .remove(&self.id);
        removed.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
#[path = "subscribers_tests.rs"]
mod tests;
