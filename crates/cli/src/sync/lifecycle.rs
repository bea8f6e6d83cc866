// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle coordinator.
//!
//! Watches the session store and keeps the channel open exactly while the
//! session has both credentials and an active company. The channel identity
//! includes the access token, so a token refresh reopens the channel with the
//! new token. Channel and session failures that concern the whole app are
//! re-published as [`LifecycleEvent`]s.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::channel::{ChannelError, ChannelManager, ChannelStatus};
use super::transport::{Transport, WebSocketTransport};
use crate::session::{SessionEnd, SessionState, SessionStore};

const EVENT_CAPACITY: usize = 16;

/// App-level notifications derived from session and channel transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The refresh token was rejected; the user must sign in again.
    SessionExpired,
    /// The channel spent its retry budget.
    ChannelExhausted,
    /// The server refused the channel's access token.
    ChannelRejected,
}

/// Starts and stops the channel as the session changes.
pub struct LifecycleCoordinator<T: Transport = WebSocketTransport> {
    session: SessionStore,
    channel: ChannelManager<T>,
    events: broadcast::Sender<LifecycleEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: Transport> LifecycleCoordinator<T> {
    /// Applies the current session state and starts watching for changes.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(session: SessionStore, channel: ChannelManager<T>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cancel = CancellationToken::new();

        let mut session_rx = session.subscribe();
        let mut status_rx = channel.watch_status();
        let initial = session_rx.borrow_and_update().clone();
        let mut last_status = *status_rx.borrow_and_update();
        let mut last_identity = initial.channel_identity();
        if let Some((company, token)) = &last_identity {
            open(&channel, company, token);
        }

        let task = {
            let channel = channel.clone();
            let events = events.clone();
            let cancel = cancel.clone();
            let mut last_ended = initial.ended;
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        changed = session_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let state = session_rx.borrow_and_update().clone();
                            if state.ended == Some(SessionEnd::Expired)
                                && last_ended != Some(SessionEnd::Expired)
                            {
                                let _ = events.send(LifecycleEvent::SessionExpired);
                            }
                            last_ended = state.ended;
                            let next = apply(&channel, last_identity.clone(), &state);
                            if next != last_identity {
                                // connect() cleared the flags; a later rejection
                                // must read as a new transition.
                                last_status = channel.status();
                            }
                            last_identity = next;
                        }
                        changed = status_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let status = *status_rx.borrow_and_update();
                            for event in status_events(&last_status, &status) {
                                let _ = events.send(event);
                            }
                            last_status = status;
                        }
                    }
                }
            })
        };

        LifecycleCoordinator {
            session,
            channel,
            events,
            cancel,
            task: Some(task),
        }
    }

    /// Receiver for lifecycle events published from now on.
    pub fn events(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn channel(&self) -> &ChannelManager<T> {
        &self.channel
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Restarts the channel with a fresh retry budget, e.g. after exhaustion.
    ///
    /// Returns false when the session has no credentials or no company.
    pub fn reconnect(&self) -> Result<bool, ChannelError> {
        let Some((company, token)) = self.session.state().channel_identity() else {
            return Ok(false);
        };
        self.channel.connect(&company, &token)?;
        Ok(true)
    }

    /// Stops watching the session and closes the channel. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            self.cancel.cancel();
            task.abort();
            self.channel.disconnect();
        }
    }
}

impl<T: Transport> Drop for LifecycleCoordinator<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn open<T: Transport>(channel: &ChannelManager<T>, company: &str, token: &str) {
    if let Err(e) = channel.connect(company, token) {
        tracing::warn!("cannot open realtime channel: {}", e);
    }
}

/// Connects or disconnects when the channel identity changed.
fn apply<T: Transport>(
    channel: &ChannelManager<T>,
    last: Option<(String, String)>,
    state: &SessionState,
) -> Option<(String, String)> {
    let next = state.channel_identity();
    if next == last {
        return next;
    }
    match &next {
        Some((company, token)) => open(channel, company, token),
        None => channel.disconnect(),
    }
    next
}

fn status_events(previous: &ChannelStatus, current: &ChannelStatus) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    if current.exhausted && !previous.exhausted {
        events.push(LifecycleEvent::ChannelExhausted);
    }
    if current.rejected && !previous.rejected {
        events.push(LifecycleEvent::ChannelRejected);
    }
    events
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
