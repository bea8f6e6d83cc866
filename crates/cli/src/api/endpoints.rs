// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Thin REST endpoints used by the shell and the sync consumers.

use rmd_core::{ReminderListResponse, ReminderQuery, Template, Tenant, TokenResponse, User};
use serde::Serialize;

use super::client::ApiClient;
use super::http::{ApiRequest, HttpExchange};
use super::{ApiError, ApiResult};

/// Body of `POST auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Body of `POST auth/companies`.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_number: Option<String>,
}

impl<H: HttpExchange> ApiClient<H> {
    /// Signs in and stores the returned credential pair.
    pub async fn login(&self, body: &LoginRequest) -> ApiResult<Option<User>> {
        let request = ApiRequest::post("auth/login", serde_json::to_value(body)?);
        self.authenticate(request).await
    }

    /// Creates an account and stores the returned credential pair.
    pub async fn register(&self, body: &RegisterRequest) -> ApiResult<Option<User>> {
        let request = ApiRequest::post("auth/register", serde_json::to_value(body)?);
        self.authenticate(request).await
    }

    async fn authenticate(&self, request: ApiRequest) -> ApiResult<Option<User>> {
        let response = self.send_anonymous(request).await?;
        let tokens: TokenResponse = serde_json::from_slice(&response.body)?;
        let (pair, user) = tokens.into_parts();
        self.session().login(pair, user.clone())?;
        Ok(user)
    }

    /// The signed-in user.
    pub async fn me(&self) -> ApiResult<User> {
        self.get_json(ApiRequest::get("auth/me")).await
    }

    /// Companies the user belongs to.
    pub async fn list_companies(&self) -> ApiResult<Vec<Tenant>> {
        self.get_json(ApiRequest::get("companies")).await
    }

    /// Creates a company and makes it the active tenant.
    pub async fn create_company(&self, body: &CompanyCreate) -> ApiResult<Tenant> {
        let request = ApiRequest::post("auth/companies", serde_json::to_value(body)?);
        let tenant: Tenant = self.get_json(request).await?;
        self.session().set_tenant(tenant.clone())?;
        Ok(tenant)
    }

    /// One page of reminders for `company_id`.
    pub async fn list_reminders(
        &self,
        company_id: &str,
        query: &ReminderQuery,
    ) -> ApiResult<ReminderListResponse> {
        let mut pairs = vec![("company_id".to_string(), company_id.to_string())];
        pairs.extend(query.to_pairs());
        self.get_json(ApiRequest::get("reminders").query(pairs))
            .await
    }

    /// Reminders for the active tenant.
    pub async fn list_current_reminders(
        &self,
        query: &ReminderQuery,
    ) -> ApiResult<ReminderListResponse> {
        let tenant = self.session().tenant().ok_or(ApiError::NoTenant)?;
        self.list_reminders(&tenant.id, query).await
    }

    /// System and company templates.
    pub async fn list_templates(&self) -> ApiResult<Vec<Template>> {
        self.get_json(ApiRequest::get("templates")).await
    }
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod tests;
