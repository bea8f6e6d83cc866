// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! remindsync - realtime sync client for the deadline reminder service.
//!
//! This crate provides the library behind the `remind` CLI: a session store,
//! a REST client that refreshes expired credentials transparently, and a
//! realtime channel that keeps collection views current.
//!
//! # Main Components
//!
//! - [`SessionStore`] - Persisted credentials and the active company
//! - [`ApiClient`](api::ApiClient) - REST client with single-flight token refresh
//! - [`ChannelManager`](sync::ChannelManager) - Push channel with bounded reconnect
//! - [`LifecycleCoordinator`](sync::LifecycleCoordinator) - Ties the channel to the session
//! - [`SyncConsumer`](sync::SyncConsumer) - Refetch-on-notify collection views
//!
//! # Usage
//!
//! ```rust,ignore
//! use remindsync::api::ApiClient;
//! use remindsync::sync::{ChannelManager, LifecycleCoordinator, SyncConsumer};
//!
//! let client = ApiClient::connect(&config.server.api_url, session.clone())?;
//! let channel = ChannelManager::websocket(config.channel_config()?);
//! let coordinator = LifecycleCoordinator::start(session, channel.clone());
//!
//! let reminders = SyncConsumer::reminders(client, Default::default());
//! let _handle = reminders.attach(&channel);
//! let mut view = reminders.watch();
//! ```

mod cli;
mod commands;
mod env;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod sync;

pub use cli::{Cli, Command, CompanyCommand, ReminderArgs};
pub use config::Config;
pub use error::{Error, Result};
pub use session::{SessionEnd, SessionState, SessionStore};

use commands::Context;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(command: Command) -> Result<()> {
    let ctx = Context::open()?;
    match command {
        Command::Login { email, password } => commands::account::login(&ctx, email, password).await,
        Command::Register {
            email,
            name,
            password,
        } => commands::account::register(&ctx, email, name, password).await,
        Command::Logout => commands::account::logout(&ctx),
        Command::Status => commands::account::status(&ctx).await,
        Command::Company(cmd) => match cmd {
            CompanyCommand::List => commands::company::list(&ctx).await,
            CompanyCommand::Create {
                name,
                business_number,
            } => commands::company::create(&ctx, name, business_number).await,
            CompanyCommand::Use { id } => commands::company::select(&ctx, &id).await,
        },
        Command::Reminders(args) => commands::reminders::list(&ctx, &args).await,
        Command::Templates => commands::reminders::templates(&ctx).await,
        Command::Watch => commands::watch::run(&ctx).await,
    }
}
