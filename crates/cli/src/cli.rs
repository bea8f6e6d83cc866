// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Args, Parser, Subcommand};

// Custom help template that groups commands into sections
const HELP_TEMPLATE: &str = "{about-with-newline}
{usage-heading} {usage}

{before-help}Options:
{options}{after-help}";

const COMMANDS_HELP: &str = "\
Account:
  login       Sign in and store the session
  register    Create an account and sign in
  logout      Forget the stored session
  status      Show who is signed in and the active company

Data:
  company     List, create, or select companies
  reminders   List reminders of the active company
  templates   List reminder templates
  watch       Follow live changes over the realtime channel";

const QUICKSTART_HELP: &str = "\
Get started:
  remind login -e me@example.com     Sign in
  remind company list                Show your companies
  remind company use <id>            Select a company
  remind reminders                   List its reminders
  remind watch                       Stream changes as they happen";

#[derive(Parser)]
#[command(name = "remind")]
#[command(about = "Deadline reminders with live sync across devices")]
#[command(help_template = HELP_TEMPLATE)]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Log connection and sync activity to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(long, short)]
        email: String,

        /// Password (read from stdin when omitted)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Account email
        #[arg(long, short)]
        email: String,

        /// Display name
        #[arg(long, short)]
        name: String,

        /// Password (read from stdin when omitted)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in and the active company
    Status,

    /// List, create, or select companies
    #[command(subcommand)]
    Company(CompanyCommand),

    /// List reminders of the active company
    #[command(after_help = "Examples:\n  \
        remind reminders                        First page of reminders\n  \
        remind reminders --open                 Only incomplete reminders\n  \
        remind reminders --year 2026 --month 3  Reminders due in March 2026")]
    Reminders(ReminderArgs),

    /// List reminder templates
    Templates,

    /// Follow live changes over the realtime channel (Ctrl-C to stop)
    Watch,
}

#[derive(Subcommand)]
pub enum CompanyCommand {
    /// List companies you belong to
    List,

    /// Create a company and select it
    Create {
        /// Company name
        name: String,

        /// Business registration number
        #[arg(long)]
        business_number: Option<String>,
    },

    /// Select the active company
    #[command(arg_required_else_help = true)]
    Use {
        /// Company ID
        id: String,
    },
}

#[derive(Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct ReminderArgs {
    /// Filter by category
    #[arg(long, short)]
    pub category: Option<String>,

    /// Only incomplete reminders
    #[arg(long, conflicts_with = "done")]
    pub open: bool,

    /// Only completed reminders
    #[arg(long)]
    pub done: bool,

    /// Deadline year
    #[arg(long)]
    pub year: Option<i32>,

    /// Deadline month (1-12)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12), requires = "year")]
    pub month: Option<u32>,

    /// Page number
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: Option<u32>,

    /// Page size
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: Option<u32>,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
