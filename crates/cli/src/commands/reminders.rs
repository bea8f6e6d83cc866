// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reminder and template listings.

use rmd_core::{Reminder, ReminderListResponse, ReminderQuery, Template};

use super::Context;
use crate::api::HttpExchange;
use crate::cli::ReminderArgs;
use crate::error::Result;

/// List one page of reminders for the active company.
pub async fn list<H: HttpExchange>(ctx: &Context<H>, args: &ReminderArgs) -> Result<()> {
    let tenant = ctx.require_company()?;
    let page = ctx
        .client
        .list_reminders(&tenant.id, &to_query(args))
        .await?;

    if page.items.is_empty() {
        println!("No reminders.");
        return Ok(());
    }
    for reminder in &page.items {
        println!("{}", format_reminder(reminder));
    }
    println!();
    println!("{}", page_footer(&page));
    Ok(())
}

/// List system and company templates.
pub async fn templates<H: HttpExchange>(ctx: &Context<H>) -> Result<()> {
    ctx.require_login()?;
    let templates = ctx.client.list_templates().await?;
    if templates.is_empty() {
        println!("No templates.");
    }
    for template in &templates {
        println!("{}", format_template(template));
    }
    Ok(())
}

pub(crate) fn to_query(args: &ReminderArgs) -> ReminderQuery {
    let completed = match (args.open, args.done) {
        (true, _) => Some(false),
        (_, true) => Some(true),
        _ => None,
    };
    ReminderQuery {
        page: args.page,
        page_size: args.page_size,
        category: args.category.clone(),
        completed,
        year: args.year,
        month: args.month,
    }
}

pub(crate) fn format_reminder(reminder: &Reminder) -> String {
    let check = if reminder.completed { "x" } else { " " };
    format!(
        "[{check}] {}  {}  ({})",
        reminder.deadline.format("%Y-%m-%d"),
        reminder.title,
        reminder.category
    )
}

pub(crate) fn format_template(template: &Template) -> String {
    let origin = if template.is_system { "system" } else { "custom" };
    format!("{}  {}  ({}, {origin})", template.id, template.name, template.category)
}

fn page_footer(page: &ReminderListResponse) -> String {
    format!(
        "Page {}/{} ({} total)",
        page.page,
        page.total_pages.max(1),
        page.total
    )
}

#[cfg(test)]
#[path = "reminders_tests.rs"]
mod tests;
