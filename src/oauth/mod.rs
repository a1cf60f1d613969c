// ABOUTME: OAuth module wiring the authorization-server adapter and the login flow
// ABOUTME: Defines the AuthorizationServer seam so tests can script the remote side
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! `OAuth2` client adapter and flow controller.
//!
//! [`AuthorizationServer`] is the seam in front of the remote authorization
//! server: building the login URI, exchanging codes, refreshing, revoking,
//! and managing tenant connections. [`client::OauthClient`] is the HTTP
//! implementation; [`flow::AuthFlow`] orchestrates the end-to-end sequences.

pub mod client;
pub mod flow;

use crate::errors::AppResult;
use crate::models::{Tenant, TokenBundle};
use async_trait::async_trait;
use uuid::Uuid;

/// Operations against the remote authorization server.
///
/// Every network operation may fail with a transient
/// [`crate::errors::AppError::Network`] (propagated, never retried
/// internally) or a server-reported status via
/// [`crate::errors::AppError::RemoteApi`].
#[async_trait]
pub trait AuthorizationServer: Send + Sync {
    /// Construct the authorization-request URL embedding the anti-forgery
    /// state and the configured scopes.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured authorization URL is malformed.
    fn build_login_uri(&self, state: &str) -> AppResult<String>;

    /// Exchange an authorization code for a token bundle, including the
    /// tenants authorized for it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AppError::ExchangeFailed`] when the server
    /// rejects the code (invalid, expired or already used).
    async fn request_access_token(&self, code: &str) -> AppResult<TokenBundle>;

    /// Exchange the refresh token for a new bundle. Rejection is terminal:
    /// the caller must restart the login.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AppError::RefreshFailed`] when the refresh
    /// token is revoked or expired.
    async fn refresh_access_token(&self, bundle: &TokenBundle) -> AppResult<TokenBundle>;

    /// Invalidate the token server-side. Revoking an already-revoked token
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures or unexpected statuses.
    async fn revoke_access_token(&self, bundle: &TokenBundle) -> AppResult<()>;

    /// List tenants currently authorized for this token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AppError::RemoteApi`] for server-reported
    /// failures.
    async fn get_connections(&self, bundle: &TokenBundle) -> AppResult<Vec<Tenant>>;

    /// Disconnect one tenant; other tenants stay valid under the bundle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::AppError::RemoteApi`] for server-reported
    /// failures (403 means the tenant's access was already revoked).
    async fn delete_connection(&self, bundle: &TokenBundle, tenant_id: Uuid) -> AppResult<()>;
}
