// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push channel transport.
//!
//! A connection is split into a sink and a stream so the channel manager can
//! wait for inbound frames and outbound sends at the same time. Frames are
//! passed through as text; decoding happens in the channel manager so that a
//! malformed payload never affects the connection.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server refused the handshake because of the credentials.
    #[error("connection rejected: {0}")]
    Rejected(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// An inbound frame the channel manager cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload.
    Text(String),
    /// The peer closed the connection, with its close code if it sent one.
    Closed(Option<u16>),
}

/// Outbound half of a connection.
pub trait FrameSink: Send {
    /// Send a text frame.
    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Close the connection.
    fn close(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;
}

/// Inbound half of a connection.
pub trait FrameStream: Send {
    /// Receive the next text or close frame.
    ///
    /// Ping, pong and binary frames are skipped. The end of the stream is
    /// reported as `Frame::Closed(None)`.
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Frame>> + Send + '_>>;
}

/// An established connection.
pub struct Connection {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens push connections. The channel manager owns one per session.
pub trait Transport: Send + Sync + 'static {
    /// Open a connection to `url`, completing the handshake.
    fn connect(
        &self,
        url: &Url,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Connection>> + Send + '_>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport
    }
}

impl Transport for WebSocketTransport {
    fn connect(
        &self,
        url: &Url,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Connection>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(handshake_error)?;

            let (sink, stream) = ws_stream.split();
            Ok(Connection {
                sink: Box::new(WebSocketSink { sink }),
                stream: Box::new(WebSocketFrames { stream }),
            })
        })
    }
}

/// Maps an HTTP 401/403 answer to the upgrade request to `Rejected`.
fn handshake_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::Http(response)
            if matches!(response.status().as_u16(), 401 | 403) =>
        {
            TransportError::Rejected(format!("handshake answered {}", response.status()))
        }
        other => TransportError::ConnectionFailed(other.to_string()),
    }
}

struct WebSocketSink {
    sink: SplitSink<WsStream, Message>,
}

impl FrameSink for WebSocketSink {
    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.sink
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.sink
                .close()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }
}

struct WebSocketFrames {
    stream: SplitStream<WsStream>,
}

impl FrameStream for WebSocketFrames {
    fn recv(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<Frame>> + Send + '_>> {
        Box::pin(async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(Frame::Text(text.as_str().to_string()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return Ok(Frame::Closed(frame.map(|f| u16::from(f.code))));
                    }
                    Some(Ok(_)) => {
                        // Ignore ping/pong/binary, continue waiting
                        continue;
                    }
                    Some(Err(e)) => {
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => return Ok(Frame::Closed(None)),
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
pub(crate) mod tests;
