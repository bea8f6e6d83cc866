// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live view of the active company.
//!
//! Opens the realtime channel through the lifecycle coordinator, keeps the
//! reminder and template collections in sync, and prints each change
//! notification and refreshed collection size until interrupted.

use std::future::Future;

use rmd_core::{ChangeEnvelope, ReminderQuery};
use tokio::sync::broadcast::error::RecvError;

use super::Context;
use crate::api::HttpExchange;
use crate::error::{Error, Result};
use crate::sync::{
    ChannelManager, CollectionView, LifecycleCoordinator, LifecycleEvent, SyncConsumer, Transport,
};

/// Follow changes over WebSocket until Ctrl-C.
pub async fn run<H: HttpExchange>(ctx: &Context<H>) -> Result<()> {
    let channel = ChannelManager::websocket(ctx.config.channel_config()?);
    follow(ctx, channel, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Follows changes on `channel` until `stop` resolves.
///
/// Ends with an error when the session expires or the channel runs out of
/// retries. A rejected token is refreshed once; the coordinator reopens the
/// channel when the new token lands in the session. A second rejection with
/// no accepted handshake since the refresh ends the session.
pub(crate) async fn follow<H, T, S>(
    ctx: &Context<H>,
    channel: ChannelManager<T>,
    stop: S,
) -> Result<()>
where
    H: HttpExchange,
    T: Transport,
    S: Future<Output = ()>,
{
    let tenant = ctx.require_company()?;
    let retries = channel.config().max_retries;
    println!("Watching {} (Ctrl-C to stop)", tenant.display_name());

    let _printer = channel.on_message(|envelope| println!("{}", format_envelope(envelope)));
    let mut coordinator = LifecycleCoordinator::start(ctx.session().clone(), channel.clone());
    let mut events = coordinator.events();

    let reminders = SyncConsumer::reminders(ctx.client.clone(), ReminderQuery::default());
    let templates = SyncConsumer::templates(ctx.client.clone());
    let _reminders_handle = reminders.attach(&channel);
    let _templates_handle = templates.attach(&channel);
    let mut reminder_view = reminders.watch();
    let mut template_view = templates.watch();
    let mut status = channel.watch_status();
    // Accepted handshake count at the last forced refresh.
    let mut refreshed_at: Option<u64> = None;

    tokio::pin!(stop);
    let outcome = loop {
        tokio::select! {
            _ = &mut stop => break Ok(()),
            event = events.recv() => match event {
                Ok(LifecycleEvent::SessionExpired) => break Err(Error::SessionExpired),
                Ok(LifecycleEvent::ChannelExhausted) => break Err(Error::ChannelExhausted { retries }),
                Ok(LifecycleEvent::ChannelRejected) => {
                    let Some((_, stale)) = channel.identity() else {
                        continue;
                    };
                    let connections = channel.status().connections;
                    if refreshed_at == Some(connections) {
                        tracing::warn!("refreshed realtime token rejected again");
                        break Err(Error::SessionExpired);
                    }
                    refreshed_at = Some(connections);
                    tracing::info!("realtime token rejected, refreshing");
                    if let Err(e) = ctx.client.force_refresh(&stale).await {
                        break Err(if e.is_session_invalid() {
                            Error::SessionExpired
                        } else {
                            e.into()
                        });
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("skipped {} lifecycle events", skipped);
                }
                Err(RecvError::Closed) => break Ok(()),
            },
            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                println!("channel: {}", current.state);
            }
            Ok(()) = reminder_view.changed() => {
                if let Some(line) = view_line("reminders", &reminder_view.borrow_and_update()) {
                    println!("{line}");
                }
            }
            Ok(()) = template_view.changed() => {
                if let Some(line) = view_line("templates", &template_view.borrow_and_update()) {
                    println!("{line}");
                }
            }
        }
    };

    coordinator.shutdown();
    outcome
}

pub(crate) fn format_envelope(envelope: &ChangeEnvelope) -> String {
    match &envelope.id {
        Some(id) => format!("{} {} {}", envelope.entity, envelope.event.as_str(), id),
        None => format!("{} {}", envelope.entity, envelope.event.as_str()),
    }
}

/// One status line per settled view; nothing while a refetch is running.
pub(crate) fn view_line<T>(label: &str, view: &CollectionView<T>) -> Option<String> {
    if view.loading {
        return None;
    }
    Some(match &view.error {
        Some(error) => format!("{label}: refresh failed ({error})"),
        None => format!("{label}: {} items", view.items.len()),
    })
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
