// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync consumers: collection views that refetch on change notifications.
//!
//! A consumer never patches its view from envelope payloads. Every matching
//! envelope triggers one full refetch through the request client, so
//! refetching twice converges to the same visible state. A consumer also
//! fetches once when attached and again whenever the channel comes back to
//! `Connected` after a gap, since envelopes sent while disconnected are lost.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rmd_core::protocol::entities;
use rmd_core::{ChangeEnvelope, Reminder, ReminderQuery, Template};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::channel::ChannelManager;
use super::subscribers::Subscription;
use super::transport::Transport;
use crate::api::{ApiClient, ApiResult, HttpExchange, ReqwestExchange};

/// Something that can fetch a whole collection.
pub trait CollectionSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn fetch(&self) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Self::Item>>> + Send + '_>>;
}

/// What a list view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView<T> {
    pub items: Vec<T>,
    pub loading: bool,
    /// Message of the last failed refetch; cleared by the next success.
    pub error: Option<String>,
    /// Number of successful refetches.
    pub revision: u64,
}

impl<T> Default for CollectionView<T> {
    fn default() -> Self {
        CollectionView {
            items: Vec::new(),
            loading: false,
            error: None,
            revision: 0,
        }
    }
}

/// A collection view kept in sync with the realtime channel.
pub struct SyncConsumer<S: CollectionSource> {
    inner: Arc<ConsumerInner<S>>,
}

struct ConsumerInner<S: CollectionSource> {
    entities: Vec<String>,
    source: S,
    view: watch::Sender<CollectionView<S::Item>>,
    refetches: AtomicU64,
}

impl<S: CollectionSource> Clone for SyncConsumer<S> {
    fn clone(&self) -> Self {
        SyncConsumer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CollectionSource> SyncConsumer<S> {
    /// Consumer of `source` interested in the given entity tags.
    pub fn new(source: S, entities: &[&str]) -> Self {
        SyncConsumer {
            inner: Arc::new(ConsumerInner {
                entities: entities.iter().map(|e| e.to_string()).collect(),
                source,
                view: watch::Sender::new(CollectionView::default()),
                refetches: AtomicU64::new(0),
            }),
        }
    }

    pub fn entities(&self) -> &[String] {
        &self.inner.entities
    }

    /// Whether `envelope` concerns this consumer.
    pub fn matches(&self, envelope: &ChangeEnvelope) -> bool {
        self.inner.entities.iter().any(|e| envelope.is_for(e))
    }

    pub fn view(&self) -> CollectionView<S::Item> {
        self.inner.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<CollectionView<S::Item>> {
        self.inner.view.subscribe()
    }

    /// Number of refetches started.
    pub fn refetch_count(&self) -> u64 {
        self.inner.refetches.load(Ordering::SeqCst)
    }

    /// Replaces the view with a fresh copy of the collection.
    ///
    /// On failure the error is recorded in the view and the previous items
    /// are kept.
    pub async fn refetch(&self) -> ApiResult<()> {
        self.inner.refetches.fetch_add(1, Ordering::SeqCst);
        self.inner.view.send_modify(|view| view.loading = true);

        match self.inner.source.fetch().await {
            Ok(items) => {
                self.inner.view.send_modify(|view| {
                    view.items = items;
                    view.loading = false;
                    view.error = None;
                    view.revision += 1;
                });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.inner.view.send_modify(|view| {
                    view.loading = false;
                    view.error = Some(message);
                });
                Err(e)
            }
        }
    }

    async fn refetch_logged(&self) {
        if let Err(e) = self.refetch().await {
            tracing::warn!("refetch of {} failed: {}", self.inner.entities.join(","), e);
        }
    }

    /// Subscribes to `channel` and starts refetching on matching envelopes.
    ///
    /// Performs an initial fetch. Must be called inside a Tokio runtime.
    pub fn attach<T: Transport>(&self, channel: &ChannelManager<T>) -> ConsumerHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let matcher = self.clone();
        let subscription = channel.on_message(move |envelope| {
            if matcher.matches(envelope) {
                let _ = tx.send(());
            }
        });

        let mut status = channel.watch_status();
        // Connections accepted before the initial fetch starts; any later
        // handshake means envelopes may have been missed.
        let mut seen = status.borrow_and_update().connections;
        let consumer = self.clone();
        let task = tokio::spawn(async move {
            consumer.refetch_logged().await;

            let mut status_open = true;
            loop {
                tokio::select! {
                    notification = rx.recv() => match notification {
                        Some(()) => consumer.refetch_logged().await,
                        None => break,
                    },
                    changed = status.changed(), if status_open => {
                        if changed.is_err() {
                            status_open = false;
                            continue;
                        }
                        let now = *status.borrow_and_update();
                        if !now.is_connected() {
                            continue;
                        }
                        // The first handshake is covered by the initial fetch.
                        if now.connections > seen.max(1) {
                            tracing::debug!("channel reconnected, resynchronizing");
                            consumer.refetch_logged().await;
                        }
                        seen = seen.max(now.connections);
                    }
                }
            }
        });

        let view = self.clone();
        ConsumerHandle {
            subscription,
            task,
            clear_loading: Some(Box::new(move || view.clear_loading())),
            detached: false,
        }
    }

    fn clear_loading(&self) {
        self.inner.view.send_if_modified(|view| {
            let was_loading = view.loading;
            view.loading = false;
            was_loading
        });
    }
}

/// Keeps a consumer attached to a channel. Dropping the handle detaches.
#[must_use = "dropping a ConsumerHandle detaches the consumer"]
pub struct ConsumerHandle {
    subscription: Subscription,
    task: JoinHandle<()>,
    clear_loading: Option<Box<dyn FnOnce() + Send + Sync>>,
    detached: bool,
}

impl std::fmt::Debug for ConsumerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerHandle")
            .field("subscription", &self.subscription)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

impl ConsumerHandle {
    /// Stops all further refetches, including queued ones.
    ///
    /// A refetch cut short leaves the previous items in the view with
    /// `loading` cleared. Returns false if already detached.
    pub fn detach(&mut self) -> bool {
        if self.detached {
            return false;
        }
        self.detached = true;
        self.subscription.unsubscribe();
        self.task.abort();
        if let Some(clear_loading) = self.clear_loading.take() {
            clear_loading();
        }
        true
    }

    pub fn is_attached(&self) -> bool {
        !self.detached
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Reminders of the active company.
pub struct ReminderSource<H: HttpExchange = ReqwestExchange> {
    client: ApiClient<H>,
    query: ReminderQuery,
}

impl<H: HttpExchange> ReminderSource<H> {
    pub fn new(client: ApiClient<H>, query: ReminderQuery) -> Self {
        ReminderSource { client, query }
    }
}

impl<H: HttpExchange> CollectionSource for ReminderSource<H> {
    type Item = Reminder;

    fn fetch(&self) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Reminder>>> + Send + '_>> {
        Box::pin(async move {
            let page = self.client.list_current_reminders(&self.query).await?;
            Ok(page.items)
        })
    }
}

/// Reminder templates.
pub struct TemplateSource<H: HttpExchange = ReqwestExchange> {
    client: ApiClient<H>,
}

impl<H: HttpExchange> TemplateSource<H> {
    pub fn new(client: ApiClient<H>) -> Self {
        TemplateSource { client }
    }
}

impl<H: HttpExchange> CollectionSource for TemplateSource<H> {
    type Item = Template;

    fn fetch(&self) -> Pin<Box<dyn Future<Output = ApiResult<Vec<Template>>> + Send + '_>> {
        Box::pin(async move { self.client.list_templates().await })
    }
}

/// Reminder list consumer.
pub type ReminderConsumer<H = ReqwestExchange> = SyncConsumer<ReminderSource<H>>;

/// Template list consumer.
pub type TemplateConsumer<H = ReqwestExchange> = SyncConsumer<TemplateSource<H>>;

impl<H: HttpExchange> SyncConsumer<ReminderSource<H>> {
    /// Consumer of `reminder` envelopes.
    pub fn reminders(client: ApiClient<H>, query: ReminderQuery) -> Self {
        Self::new(ReminderSource::new(client, query), &[entities::REMINDER])
    }
}

impl<H: HttpExchange> SyncConsumer<TemplateSource<H>> {
    /// Consumer of `template` envelopes.
    pub fn templates(client: ApiClient<H>) -> Self {
        Self::new(TemplateSource::new(client), &[entities::TEMPLATE])
    }
}

#[cfg(test)]
#[path = "consumer_tests.rs"]
mod tests;
