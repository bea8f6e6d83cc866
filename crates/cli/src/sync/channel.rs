// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel manager.
//!
//! Maintains one logical push connection per `(company, access token)`
//! identity. Unexpected closures are retried with bounded exponential backoff;
//! an intentional [`ChannelManager::disconnect`] cancels any pending retry
//! before returning. Decoded envelopes fan out to every registered handler.
//!
//! Every `connect`/`disconnect` bumps a generation counter. Connection and
//! backoff tasks carry the generation they were started with and stand down
//! when it no longer matches, so a stale task can never revive a torn-down
//! session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rmd_core::protocol::CLOSE_TOKEN_REJECTED;
use rmd_core::ChangeEnvelope;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::subscribers::{SubscriberSet, Subscription};
use super::transport::{Connection, Frame, Transport, TransportError, WebSocketTransport};

/// Errors from the channel manager.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("cannot build realtime endpoint from '{0}'\n  hint: server.ws_url must be an absolute ws:// or wss:// URL")]
    InvalidEndpoint(String),
}

/// Endpoint and reconnect policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Realtime base URL; `/ws/{company}` is appended.
    pub url: Url,
    /// Delay before the first reconnect.
    pub base_delay: Duration,
    /// Ceiling for the reconnect delay.
    pub max_delay: Duration,
    /// Closures tolerated since the last successful handshake.
    pub max_retries: u32,
}

impl ChannelConfig {
    /// Config with the default policy: 1s base, 30s ceiling, 5 retries.
    pub fn new(url: Url) -> Self {
        ChannelConfig {
            url,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            max_retries: 5,
        }
    }

    /// Delay before the reconnect that follows `retry_count` earlier ones:
    /// `min(base * 2^retry_count, max)`.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let multiplier = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(multiplier).min(max_ms))
    }

    /// `{url}/ws/{company}?token={token}`.
    pub fn endpoint(&self, company: &str, token: &str) -> Result<Url, ChannelError> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| ChannelError::InvalidEndpoint(self.url.to_string()))?
            .pop_if_empty()
            .push("ws")
            .push(company);
        url.query_pairs_mut().clear().append_pair("token", token);
        Ok(url)
    }
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection. Also the terminal state after the retry budget is spent.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Handshake completed; frames are flowing.
    Connected,
    /// Waiting `delay` before reconnect number `attempt`.
    ReconnectingBackoff { attempt: u32, delay: Duration },
    /// Closed by [`ChannelManager::disconnect`]; never reconnects on its own.
    IntentionallyClosed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::ReconnectingBackoff { .. } => "reconnecting",
            ConnectionState::IntentionallyClosed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::ReconnectingBackoff { attempt, delay } => write!(
                f,
                "reconnecting (attempt {}, in {}ms)",
                attempt,
                delay.as_millis()
            ),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Snapshot published on every transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStatus {
    pub state: ConnectionState,
    pub retry_count: u32,
    /// The retry budget was spent; only a new `connect` resumes.
    pub exhausted: bool,
    /// The server refused the access token.
    pub rejected: bool,
    /// Handshakes accepted over the manager's lifetime. Never reset, so a
    /// reconnect is visible even when intermediate states were missed.
    pub connections: u64,
}

impl ChannelStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Push channel handle. Cloning is cheap and shares the connection.
pub struct ChannelManager<T: Transport = WebSocketTransport> {
    shared: Arc<Shared<T>>,
}

impl<T: Transport> Clone for ChannelManager<T> {
    fn clone(&self) -> Self {
        ChannelManager {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<T> {
    config: ChannelConfig,
    transport: T,
    state: Mutex<ChannelState>,
    subscribers: SubscriberSet,
    status: watch::Sender<ChannelStatus>,
}

#[derive(Default)]
struct ChannelState {
    identity: Option<(String, String)>,
    endpoint: Option<Url>,
    generation: u64,
    retry_count: u32,
    intentionally_closed: bool,
    exhausted: bool,
    rejected: bool,
    connections: u64,
    connection: ConnectionState,
    cancel: CancellationToken,
    backoff: Option<JoinHandle<()>>,
    outbound: Option<mpsc::UnboundedSender<String>>,
}

impl ChannelState {
    fn status(&self) -> ChannelStatus {
        ChannelStatus {
            state: self.connection,
            retry_count: self.retry_count,
            exhausted: self.exhausted,
            rejected: self.rejected,
            connections: self.connections,
        }
    }

    /// Cancels the connection task and any pending backoff timer.
    fn teardown(&mut self) {
        self.cancel.cancel();
        if let Some(backoff) = self.backoff.take() {
            backoff.abort();
        }
        self.outbound = None;
    }
}

impl ChannelManager<WebSocketTransport> {
    /// Manager over a real WebSocket transport.
    pub fn websocket(config: ChannelConfig) -> Self {
        Self::new(config, WebSocketTransport::new())
    }
}

impl<T: Transport> ChannelManager<T> {
    pub fn new(config: ChannelConfig, transport: T) -> Self {
        ChannelManager {
            shared: Arc::new(Shared {
                config,
                transport,
                state: Mutex::new(ChannelState::default()),
                subscribers: SubscriberSet::new(),
                status: watch::Sender::new(ChannelStatus::default()),
            }),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    /// Opens the channel for `company` with `token`.
    ///
    /// A no-op while already connecting or connected with the same identity.
    /// Otherwise any existing connection is torn down and a new session
    /// starts with a fresh retry budget. Must be called inside a Tokio
    /// runtime.
    pub fn connect(&self, company: &str, token: &str) -> Result<(), ChannelError> {
        let endpoint = self.shared.config.endpoint(company, token)?;
        let mut st = self.shared.lock();

        let same_identity = st
            .identity
            .as_ref()
            .is_some_and(|(c, t)| c == company && t == token);
        if same_identity
            && matches!(
                st.connection,
                ConnectionState::Connecting | ConnectionState::Connected
            )
        {
            tracing::debug!("realtime channel already open for {}", company);
            return Ok(());
        }

        st.teardown();
        st.generation += 1;
        st.identity = Some((company.to_string(), token.to_string()));
        st.endpoint = Some(endpoint);
        st.retry_count = 0;
        st.intentionally_closed = false;
        st.exhausted = false;
        st.rejected = false;
        st.cancel = CancellationToken::new();

        tracing::info!("opening realtime channel for {}", company);
        self.shared.start_attempt(&mut st);
        self.shared.publish(&st);
        Ok(())
    }

    /// Closes the channel and cancels any pending reconnect.
    ///
    /// Idempotent. No automatic reconnect follows until the next `connect`.
    pub fn disconnect(&self) {
        let mut st = self.shared.lock();
        st.teardown();
        st.generation += 1;
        st.identity = None;
        st.endpoint = None;
        st.intentionally_closed = true;
        if st.connection != ConnectionState::IntentionallyClosed {
            tracing::info!("realtime channel closed");
        }
        st.connection = ConnectionState::IntentionallyClosed;
        self.shared.publish(&st);
    }

    /// Registers `handler` for every decoded envelope.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEnvelope) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(handler)
    }

    /// Queues `envelope` for sending. Dropped unless connected.
    ///
    /// Returns whether the envelope was queued.
    pub fn send(&self, envelope: &ChangeEnvelope) -> bool {
        let st = self.shared.lock();
        if st.connection != ConnectionState::Connected {
            tracing::debug!("dropping outbound {} envelope: channel not connected", envelope.entity);
            return false;
        }
        let Some(outbound) = &st.outbound else {
            return false;
        };
        match envelope.to_json() {
            Ok(json) => outbound.send(json).is_ok(),
            Err(e) => {
                tracing::warn!("failed to encode outbound envelope: {}", e);
                false
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().connection
    }

    pub fn status(&self) -> ChannelStatus {
        self.shared.lock().status()
    }

    /// Receiver that observes every status transition.
    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.shared.status.subscribe()
    }

    /// `(company, access token)` of the current session, if any.
    pub fn identity(&self) -> Option<(String, String)> {
        self.shared.lock().identity.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }
}

impl<T: Transport> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, st: &ChannelState) {
        let status = st.status();
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                tracing::debug!("realtime channel: {}", status.state);
                *current = status;
                true
            }
        });
    }

    fn start_attempt(self: &Arc<Self>, st: &mut ChannelState) {
        let Some(endpoint) = st.endpoint.clone() else {
            return;
        };
        st.connection = ConnectionState::Connecting;
        st.outbound = None;
        tokio::spawn(run_connection(
            Arc::clone(self),
            st.generation,
            st.cancel.clone(),
            endpoint,
        ));
    }

    fn dispatch(&self, text: &str) {
        match ChangeEnvelope::from_json(text) {
            Ok(envelope) => {
                tracing::debug!("{} {}", envelope.event, envelope.entity);
                self.subscribers.publish(&envelope);
            }
            Err(e) => tracing::warn!("discarding malformed realtime message: {}", e),
        }
    }

    fn on_close(self: &Arc<Self>, generation: u64, code: Option<u16>) {
        if code == Some(CLOSE_TOKEN_REJECTED) {
            self.on_rejected(generation);
        } else {
            self.on_unexpected_close(generation, code);
        }
    }

    fn on_rejected(&self, generation: u64) {
        let mut st = self.lock();
        if st.generation != generation || st.intentionally_closed {
            return;
        }
        tracing::warn!("realtime channel rejected the access token");
        st.outbound = None;
        st.rejected = true;
        st.connection = ConnectionState::Disconnected;
        self.publish(&st);
    }

    fn on_unexpected_close(self: &Arc<Self>, generation: u64, code: Option<u16>) {
        let mut st = self.lock();
        if st.generation != generation || st.intentionally_closed {
            return;
        }
        st.outbound = None;
        if st.backoff.as_ref().is_some_and(|b| !b.is_finished()) {
            return;
        }

        let attempt = st.retry_count + 1;
        if attempt >= self.config.max_retries {
            tracing::warn!(
                "realtime channel gave up after {} reconnect attempts",
                st.retry_count
            );
            st.exhausted = true;
            st.connection = ConnectionState::Disconnected;
            self.publish(&st);
            return;
        }

        let delay = self.config.backoff_delay(st.retry_count);
        st.retry_count = attempt;
        st.connection = ConnectionState::ReconnectingBackoff { attempt, delay };
        tracing::info!(
            "realtime channel closed (code {:?}), reconnecting in {}ms",
            code,
            delay.as_millis()
        );

        let shared = Arc::clone(self);
        let cancel = st.cancel.clone();
        st.backoff = Some(tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => shared.fire_reconnect(generation),
            }
        }));
        self.publish(&st);
    }

    fn fire_reconnect(self: &Arc<Self>, generation: u64) {
        let mut st = self.lock();
        if st.generation != generation || st.intentionally_closed {
            return;
        }
        st.backoff = None;
        self.start_attempt(&mut st);
        self.publish(&st);
    }
}

async fn run_connection<T: Transport>(
    shared: Arc<Shared<T>>,
    generation: u64,
    cancel: CancellationToken,
    endpoint: Url,
) {
    let result = tokio::select! {
        _ = cancel.cancelled() => return,
        result = shared.transport.connect(&endpoint) => result,
    };

    let Connection {
        mut sink,
        mut stream,
    } = match result {
        Ok(connection) => connection,
        Err(TransportError::Rejected(reason)) => {
            tracing::warn!("realtime handshake rejected: {}", reason);
            shared.on_rejected(generation);
            return;
        }
        Err(e) => {
            tracing::warn!("realtime handshake failed: {}", e);
            shared.on_unexpected_close(generation, None);
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let accepted = {
        let mut st = shared.lock();
        if st.generation == generation && !cancel.is_cancelled() {
            st.connection = ConnectionState::Connected;
            st.retry_count = 0;
            st.connections += 1;
            st.outbound = Some(tx);
            shared.publish(&st);
            true
        } else {
            false
        }
    };
    if !accepted {
        let _ = sink.close().await;
        return;
    }
    tracing::info!("realtime channel connected");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.close().await;
                return;
            }
            frame = stream.recv() => match frame {
                Ok(Frame::Text(text)) => shared.dispatch(&text),
                Ok(Frame::Closed(code)) => {
                    shared.on_close(generation, code);
                    return;
                }
                Err(e) => {
                    tracing::warn!("realtime receive failed: {}", e);
                    shared.on_close(generation, None);
                    return;
                }
            },
            Some(text) = rx.recv() => {
                if let Err(e) = sink.send(text).await {
                    tracing::warn!("realtime send failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
