// ABOUTME: Core data structures for the OAuth2 token lifecycle and local user records
// ABOUTME: Defines token bundles, authorized tenants, and the persisted user projection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Data model shared across the token store, flow controller and routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organisation the signed-in user has connected to this application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Opaque unique identifier assigned by the accounting platform
    pub tenant_id: Uuid,
    /// Display name, when the platform reports one
    pub tenant_name: Option<String>,
    /// Organisation type, e.g. "ORGANISATION" or "PRACTICE"
    pub tenant_type: Option<String>,
}

impl Tenant {
    /// Create a tenant carrying only its identifier
    #[must_use]
    pub const fn new(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            tenant_name: None,
            tenant_type: None,
        }
    }
}

/// The access/refresh/ID-token triple issued by the authorization server,
/// together with its expiry and the tenants it is authorized for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    /// Opaque bearer token for API calls
    pub access_token: String,
    /// Opaque token used to obtain a new bundle once the access token expires
    pub refresh_token: String,
    /// Signed identity claims about the authenticated user, when requested
    pub id_token: Option<String>,
    /// Instant after which the access token must not be used without a refresh
    pub expires_at: DateTime<Utc>,
    /// Organisations this bundle may act on
    pub tenants: Vec<Tenant>,
}

impl TokenBundle {
    /// Whether the access token is past its expiry and needs a refresh
    /// before any API use.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Find an authorized tenant by id.
    #[must_use]
    pub fn tenant(&self, tenant_id: Uuid) -> Option<&Tenant> {
        self.tenants.iter().find(|t| t.tenant_id == tenant_id)
    }

    /// Remove a tenant from the authorized list. Returns true when the
    /// tenant was present.
    pub fn remove_tenant(&mut self, tenant_id: Uuid) -> bool {
        let before = self.tenants.len();
        self.tenants.retain(|t| t.tenant_id != tenant_id);
        self.tenants.len() != before
    }
}

/// Persisted projection of ID-token claims, keyed by the external user id.
///
/// This is the row shape of the local `users` table. It is rebuilt from the
/// ID token on every successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    /// Email address claim
    pub email: String,
    /// Stable user identifier assigned by the accounting platform
    pub external_user_id: String,
    /// Platform session identifier from the ID token
    pub session_id: String,
    /// Full display name
    pub name: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// Records rendered on the dashboard, fetched from the remote accounting API.
///
/// The remote API is an opaque collaborator; its record shapes are passed
/// through as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    /// Organisation details for the current tenant
    pub organisation: serde_json::Value,
    /// Chart of accounts
    pub accounts: serde_json::Value,
    /// Contact records
    pub contacts: serde_json::Value,
}
