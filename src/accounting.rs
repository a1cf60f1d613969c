// ABOUTME: Thin HTTP client for the remote accounting API used by the dashboard
// ABOUTME: Fetches organisation, account and contact records for the effective tenant
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Remote accounting API client.
//!
//! The accounting API is an opaque collaborator: its record payloads pass
//! through as JSON. A 403 means the tenant's access to this application
//! was revoked; callers react by redirecting to re-authorize.

use crate::errors::{AppError, AppResult};
use crate::models::DashboardData;
use uuid::Uuid;

/// Header naming the tenant a request acts on.
const TENANT_HEADER: &str = "x-tenant-id";

/// Client for organisation/account/contact lookups.
pub struct AccountingApi {
    base_url: String,
    client: reqwest::Client,
}

impl AccountingApi {
    /// Create a client against the configured API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn get(
        &self,
        path: &str,
        access_token: &str,
        tenant_id: Uuid,
    ) -> AppResult<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .bearer_auth(access_token)
            .header(TENANT_HEADER, tenant_id.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Organisation details for the tenant.
    ///
    /// # Errors
    ///
    /// [`AppError::RemoteApi`] for server-reported statuses (403 = access
    /// revoked), [`AppError::Network`] for transport failures.
    pub async fn get_organisations(
        &self,
        access_token: &str,
        tenant_id: Uuid,
    ) -> AppResult<serde_json::Value> {
        self.get("organisations", access_token, tenant_id).await
    }

    /// Chart of accounts for the tenant.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get_organisations`].
    pub async fn get_accounts(
        &self,
        access_token: &str,
        tenant_id: Uuid,
    ) -> AppResult<serde_json::Value> {
        self.get("accounts", access_token, tenant_id).await
    }

    /// Contact records for the tenant.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get_organisations`].
    pub async fn get_contacts(
        &self,
        access_token: &str,
        tenant_id: Uuid,
    ) -> AppResult<serde_json::Value> {
        self.get("contacts", access_token, tenant_id).await
    }

    /// Fetch everything the dashboard renders in one pass.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::get_organisations`].
    pub async fn dashboard_data(
        &self,
        access_token: &str,
        tenant_id: Uuid,
    ) -> AppResult<DashboardData> {
        let organisation = self.get_organisations(access_token, tenant_id).await?;
        let contacts = self.get_contacts(access_token, tenant_id).await?;
        let accounts = self.get_accounts(access_token, tenant_id).await?;

        Ok(DashboardData {
            organisation,
            accounts,
            contacts,
        })
    }
}
