// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Company (tenant) management.

use rmd_core::Tenant;

use super::Context;
use crate::api::{CompanyCreate, HttpExchange};
use crate::error::{Error, Result};

/// List companies, marking the active one.
pub async fn list<H: HttpExchange>(ctx: &Context<H>) -> Result<()> {
    ctx.require_login()?;
    let companies = ctx.client.list_companies().await?;
    if companies.is_empty() {
        println!("No companies yet. Run 'remind company create <name>'.");
        return Ok(());
    }
    let active = ctx.session().tenant().map(|t| t.id);
    for company in &companies {
        println!(
            "{}",
            format_company(company, active.as_deref() == Some(company.id.as_str()))
        );
    }
    Ok(())
}

/// Create a company; the server makes the caller its owner.
pub async fn create<H: HttpExchange>(
    ctx: &Context<H>,
    name: String,
    business_number: Option<String>,
) -> Result<()> {
    ctx.require_login()?;
    let tenant = ctx
        .client
        .create_company(&CompanyCreate {
            name,
            business_number,
        })
        .await?;
    println!("Created {} ({})", tenant.display_name(), tenant.id);
    Ok(())
}

/// Select the active company by id.
pub async fn select<H: HttpExchange>(ctx: &Context<H>, id: &str) -> Result<()> {
    ctx.require_login()?;
    let tenant = ctx
        .client
        .list_companies()
        .await?
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::CompanyNotFound(id.to_string()))?;
    ctx.session().set_tenant(tenant.clone())?;
    println!("Active company: {}", tenant.display_name());
    Ok(())
}

pub(crate) fn format_company(company: &Tenant, active: bool) -> String {
    let marker = if active { "*" } else { " " };
    match &company.business_number {
        Some(number) => format!("{marker} {}  {} [{number}]", company.id, company.display_name()),
        None => format!("{marker} {}  {}", company.id, company.display_name()),
    }
}

#[cfg(test)]
#[path = "company_tests.rs"]
mod tests;
