// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module, and the mock transport shared with the
//! channel tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

/// Mock transport for testing without real sockets.
///
/// Every successful connect creates a peer; tests drive the latest peer with
/// [`MockTransport::push`] and [`MockTransport::close_latest`].
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    state: Mutex<MockState>,
    attempts: watch::Sender<usize>,
}

#[derive(Default)]
struct MockState {
    attempts: Vec<(Url, Instant)>,
    fail_next: usize,
    reject_next: usize,
    peers: Vec<MockPeer>,
}

#[derive(Clone)]
struct MockPeer {
    inbound: mpsc::UnboundedSender<Frame>,
    outbound: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            inner: Arc::new(MockInner {
                state: Mutex::new(MockState::default()),
                attempts: watch::Sender::new(0),
            }),
        }
    }

    /// Fail the next `n` handshakes.
    pub fn fail_next_connects(&self, n: usize) {
        self.inner.state.lock().unwrap().fail_next = n;
    }

    /// Refuse the next `n` handshakes as unauthorized.
    pub fn reject_next_connects(&self, n: usize) {
        self.inner.state.lock().unwrap().reject_next = n;
    }

    /// Number of connect calls so far.
    pub fn attempts(&self) -> usize {
        *self.inner.attempts.borrow()
    }

    /// Instants at which each connect call happened.
    pub fn attempt_times(&self) -> Vec<Instant> {
        let state = self.inner.state.lock().unwrap();
        state.attempts.iter().map(|(_, at)| *at).collect()
    }

    pub fn attempt_urls(&self) -> Vec<Url> {
        let state = self.inner.state.lock().unwrap();
        state.attempts.iter().map(|(url, _)| url.clone()).collect()
    }

    /// Waits until at least `n` connect calls happened.
    pub async fn wait_for_attempts(&self, n: usize) {
        let mut rx = self.inner.attempts.subscribe();
        rx.wait_for(|count| *count >= n).await.unwrap();
    }

    /// Number of connections that were established.
    pub fn connections(&self) -> usize {
        self.inner.state.lock().unwrap().peers.len()
    }

    fn latest(&self) -> MockPeer {
        self.inner
            .state
            .lock()
            .unwrap()
            .peers
            .last()
            .cloned()
            .expect("no established connection")
    }

    /// Deliver a text frame on the latest connection.
    pub fn push(&self, text: &str) {
        let _ = self.latest().inbound.send(Frame::Text(text.to_string()));
    }

    /// Close the latest connection from the server side.
    pub fn close_latest(&self, code: Option<u16>) {
        let _ = self.latest().inbound.send(Frame::Closed(code));
    }

    /// Frames sent on the latest connection.
    pub fn sent(&self) -> Vec<String> {
        self.latest().outbound.lock().unwrap().clone()
    }

    /// Whether the client closed the latest connection.
    pub fn latest_closed(&self) -> bool {
        self.latest().closed.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn connect(
        &self,
        url: &Url,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Connection>> + Send + '_>> {
        let url = url.clone();
        Box::pin(async move {
            let outcome = {
                let mut state = self.inner.state.lock().unwrap();
                state.attempts.push((url, Instant::now()));
                if state.reject_next > 0 {
                    state.reject_next -= 1;
                    Err(TransportError::Rejected("mock rejection".into()))
                } else if state.fail_next > 0 {
                    state.fail_next -= 1;
                    Err(TransportError::ConnectionFailed("mock failure".into()))
                } else {
                    let (inbound, rx) = mpsc::unbounded_channel();
                    let peer = MockPeer {
                        inbound,
                        outbound: Arc::new(Mutex::new(Vec::new())),
                        closed: Arc::new(AtomicBool::new(false)),
                    };
                    state.peers.push(peer.clone());
                    Ok(Connection {
                        sink: Box::new(MockSink {
                            outbound: peer.outbound,
                            closed: peer.closed,
                        }),
                        stream: Box::new(MockStream { rx }),
                    })
                }
            };
            self.inner.attempts.send_modify(|count| *count += 1);
            outcome
        })
    }
}

struct MockSink {
    outbound: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FrameSink for MockSink {
    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TransportError::ConnectionClosed);
            }
            self.outbound.lock().unwrap().push(text);
            Ok(())
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl FrameStream for MockStream {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Frame>> + Send + '_>> {
        Box::pin(async move { Ok(self.rx.recv().await.unwrap_or(Frame::Closed(None))) })
    }
}

#[tokio::test]
async fn test_mock_transport_connect() {
    let transport = MockTransport::new();
    let url = Url::parse("ws://localhost:1234/ws/c1?token=a0").unwrap();

    let mut conn = transport.connect(&url).await.unwrap();
    assert_eq!(transport.attempts(), 1);
    assert_eq!(transport.attempt_urls()[0], url);

    transport.push(r#"{"event":"created","entity":"reminder"}"#);
    assert_eq!(
        conn.stream.recv().await.unwrap(),
        Frame::Text(r#"{"event":"created","entity":"reminder"}"#.to_string())
    );

    conn.sink.send("hello".to_string()).await.unwrap();
    assert_eq!(transport.sent(), vec!["hello"]);

    conn.sink.close().await.unwrap();
    assert!(transport.latest_closed());
    assert!(conn.sink.send("late".to_string()).await.is_err());
}

#[tokio::test]
async fn test_mock_transport_scripted_failures() {
    let transport = MockTransport::new();
    let url = Url::parse("ws://localhost:1234/ws/c1").unwrap();
    transport.reject_next_connects(1);
    transport.fail_next_connects(1);

    assert!(matches!(
        transport.connect(&url).await,
        Err(TransportError::Rejected(_))
    ));
    assert!(matches!(
        transport.connect(&url).await,
        Err(TransportError::ConnectionFailed(_))
    ));
    assert!(transport.connect(&url).await.is_ok());
    assert_eq!(transport.attempts(), 3);
    assert_eq!(transport.connections(), 1);
}

#[tokio::test]
async fn test_mock_close_frame_carries_code() {
    let transport = MockTransport::new();
    let url = Url::parse("ws://localhost:1234/ws/c1").unwrap();
    let mut conn = transport.connect(&url).await.unwrap();

    transport.close_latest(Some(4001));
    assert_eq!(conn.stream.recv().await.unwrap(), Frame::Closed(Some(4001)));
}

#[tokio::test]
async fn test_websocket_connect_refused() {
    let transport = WebSocketTransport::new();
    let url = Url::parse("ws://127.0.0.1:9/ws/c1").unwrap();

    let err = transport.connect(&url).await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionFailed(_)));
}
