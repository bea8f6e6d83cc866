// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime synchronization.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ connect/disconnect ┌──────────────┐     ┌─────────────┐
//! │  Lifecycle   │───────────────────►│   Channel    │────►│  Transport  │
//! │ Coordinator  │                    │   Manager    │◄────│   (trait)   │
//! └──────────────┘                    └──────────────┘     └─────────────┘
//!        ▲                                   │ envelopes
//!        │ session changes                   ▼
//! ┌──────────────┐      refetch       ┌──────────────┐
//! │ SessionStore │◄───────────────────│    Sync      │
//! └──────────────┘   (via ApiClient)  │  Consumers   │
//!                                     └──────────────┘
//! ```
//!
//! # Features
//!
//! - One push connection per (company, access token) identity
//! - Bounded exponential backoff, cancelled by intentional close
//! - Broadcast fan-out with idempotent unsubscribe
//! - Full refetch on change notifications and after reconnects
//! - Injectable transport trait for testing

mod channel;
mod consumer;
mod lifecycle;
mod subscribers;
mod transport;

pub use channel::{ChannelConfig, ChannelError, ChannelManager, ChannelStatus, ConnectionState};
pub use consumer::{
    CollectionSource, CollectionView, ConsumerHandle, ReminderConsumer, ReminderSource,
    SyncConsumer, TemplateConsumer, TemplateSource,
};
pub use lifecycle::{LifecycleCoordinator, LifecycleEvent};
pub use subscribers::{SubscriberSet, Subscription};
pub use transport::{
    Connection, Frame, FrameSink, FrameStream, Transport, TransportError, TransportResult,
    WebSocketTransport,
};
#[cfg(test)]
pub(crate) use transport::tests::MockTransport;
