// ABOUTME: End-to-end authorization flow controller for login, callback, disconnect, revoke
// ABOUTME: Enforces the anti-forgery check, token validation and expiry-driven refresh
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Authorization flow controller.
//!
//! One canonical flow replaces the near-identical controller variants of
//! the original sample; the behaviors that differed between them sit
//! behind [`FlowOptions`]. The anti-forgery check completes before any
//! exchange is attempted, and a refresh completes before any downstream
//! use of the access token within the same request.

use super::AuthorizationServer;
use crate::auth;
use crate::database::UserStore;
use crate::errors::{AppError, AppResult};
use crate::models::TokenBundle;
use crate::session::{Principal, SessionContext};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Behavior switches for the flow variants found in the original sample.
#[derive(Debug, Clone, Copy)]
pub struct FlowOptions {
    /// End the local session when the last tenant is disconnected.
    pub sign_out_on_full_disconnect: bool,
    /// Delete the local account even when tenants remain after a
    /// disconnect (the original's latest variant always deletes).
    pub delete_account_on_partial_disconnect: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            sign_out_on_full_disconnect: true,
            delete_account_on_partial_disconnect: true,
        }
    }
}

/// Result of a disconnect operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// No token was stored; the caller redirects home.
    AlreadySignedOut,
    /// A tenant was removed and others remain authorized.
    Partial {
        /// Tenant selected as current after the removal
        current: Uuid,
    },
    /// The last tenant was removed; token destroyed.
    Full,
}

/// Result of a revoke operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// No token was stored; the caller redirects home.
    AlreadySignedOut,
    /// Token revoked server-side and destroyed locally.
    Revoked,
}

/// Orchestrates the login/callback/disconnect/revoke sequences.
pub struct AuthFlow {
    server: Arc<dyn AuthorizationServer>,
    users: Arc<UserStore>,
    client_id: String,
    options: FlowOptions,
}

impl AuthFlow {
    /// Create the flow controller.
    #[must_use]
    pub fn new(
        server: Arc<dyn AuthorizationServer>,
        users: Arc<UserStore>,
        client_id: impl Into<String>,
        options: FlowOptions,
    ) -> Self {
        Self {
            server,
            users,
            client_id: client_id.into(),
            options,
        }
    }

    /// Start a login: store a fresh anti-forgery state and return the
    /// authorization URL to redirect to.
    ///
    /// # Errors
    ///
    /// Returns an error when the authorization URL cannot be built.
    pub async fn begin_login(&self, session: &SessionContext) -> AppResult<String> {
        let state = Uuid::new_v4().to_string();
        session.store_state(state.clone()).await;

        let uri = self.server.build_login_uri(&state)?;
        info!("login initiated");
        Ok(uri)
    }

    /// Handle the authorization callback: verify the anti-forgery state,
    /// exchange the code, validate the returned tokens, then establish
    /// the session and upsert the local account.
    ///
    /// # Errors
    ///
    /// [`AppError::ForgeryDetected`] on state mismatch,
    /// [`AppError::TokenValidation`] on an untrusted token,
    /// [`AppError::ExchangeFailed`] when the server rejects the code.
    /// All are terminal: nothing is stored and no session is established.
    pub async fn handle_callback(
        &self,
        session: &SessionContext,
        code: &str,
        state: &str,
    ) -> AppResult<()> {
        // The stored state is consumed here whatever happens next; a
        // replayed callback finds nothing to match.
        let expected = session.take_state().await;
        if expected.as_deref() != Some(state) {
            warn!("callback state did not match the pending login attempt");
            return Err(AppError::ForgeryDetected);
        }

        let bundle = self.server.request_access_token(code).await?;

        if let Some(id_token) = &bundle.id_token {
            if !auth::validate_id_token(id_token, &self.client_id) {
                return Err(AppError::TokenValidation("ID token is not valid".into()));
            }
        }
        if !auth::validate_access_token(&bundle.access_token) {
            return Err(AppError::TokenValidation("access token is not valid".into()));
        }

        let id_token = bundle.id_token.as_deref().ok_or_else(|| {
            AppError::TokenValidation("authorization response did not include an ID token".into())
        })?;
        let user = auth::user_from_id_token(id_token)?;

        // All validation passed; only now does stored state change.
        session.store_token(bundle).await;
        self.users.upsert_user(&user).await?;
        session.sign_in(Principal::from_user(&user)).await;

        info!(user = %user.external_user_id, "callback completed, session established");
        Ok(())
    }

    /// Disconnect the current tenant. With tenants remaining the next one
    /// becomes current; with none remaining the token is destroyed and,
    /// per [`FlowOptions`], the local session ends.
    ///
    /// # Errors
    ///
    /// Refresh rejection surfaces as [`AppError::RefreshFailed`] after
    /// best-effort local cleanup; remote failures propagate.
    pub async fn disconnect(&self, session: &SessionContext) -> AppResult<DisconnectOutcome> {
        let Some(bundle) = session.stored_token().await else {
            return Ok(DisconnectOutcome::AlreadySignedOut);
        };

        let mut bundle = self.fresh_or_cleanup(session, bundle).await?;

        let current = session.current_tenant_id().await;
        let Some(tenant_id) = current
            .filter(|id| bundle.tenant(*id).is_some())
            .or_else(|| bundle.tenants.first().map(|t| t.tenant_id))
        else {
            // Nothing left to disconnect remotely.
            self.full_disconnect_cleanup(session, &bundle).await?;
            return Ok(DisconnectOutcome::Full);
        };

        self.server.delete_connection(&bundle, tenant_id).await?;
        bundle.remove_tenant(tenant_id);
        info!(tenant = %tenant_id, remaining = bundle.tenants.len(), "tenant disconnected");

        if let Some(next) = bundle.tenants.first().map(|t| t.tenant_id) {
            session.store_token(bundle).await;
            session.store_tenant_id(next).await;

            if self.options.delete_account_on_partial_disconnect {
                let user = signed_in_user_id(session).await;
                self.delete_account(user.as_deref()).await?;
            }
            Ok(DisconnectOutcome::Partial { current: next })
        } else {
            self.full_disconnect_cleanup(session, &bundle).await?;
            Ok(DisconnectOutcome::Full)
        }
    }

    /// Revoke the token server-side and end the local session. Invoking
    /// revoke with no stored token is not an error: the session is
    /// already signed out.
    ///
    /// # Errors
    ///
    /// Refresh rejection surfaces as [`AppError::RefreshFailed`] after
    /// best-effort local cleanup; remote failures propagate.
    pub async fn revoke(&self, session: &SessionContext) -> AppResult<RevokeOutcome> {
        let Some(bundle) = session.stored_token().await else {
            return Ok(RevokeOutcome::AlreadySignedOut);
        };

        let bundle = self.fresh_or_cleanup(session, bundle).await?;

        self.server.revoke_access_token(&bundle).await?;
        session.destroy_token().await;
        session.sign_out().await;

        info!("token revoked, session ended");
        Ok(RevokeOutcome::Revoked)
    }

    /// The stored bundle, refreshed first when expired. API-invoking
    /// callers must use the returned bundle, never a stale copy.
    ///
    /// # Errors
    ///
    /// [`AppError::NotSignedIn`] with no stored token (callers redirect
    /// to re-authorize); [`AppError::RefreshFailed`] when the refresh
    /// token is rejected.
    pub async fn current_bundle(&self, session: &SessionContext) -> AppResult<TokenBundle> {
        let bundle = session.stored_token().await.ok_or(AppError::NotSignedIn)?;
        self.ensure_fresh(session, bundle).await
    }

    /// Refresh the bundle when expired, storing and returning the new one.
    ///
    /// # Errors
    ///
    /// [`AppError::RefreshFailed`] when the server rejects the refresh
    /// token (terminal; the caller must restart login).
    pub async fn ensure_fresh(
        &self,
        session: &SessionContext,
        bundle: TokenBundle,
    ) -> AppResult<TokenBundle> {
        if !bundle.is_expired() {
            return Ok(bundle);
        }

        info!("access token expired, refreshing");
        let refreshed = self.server.refresh_access_token(&bundle).await?;
        session.store_token(refreshed.clone()).await;
        Ok(refreshed)
    }

    /// Re-list the authorized tenants from the server and store the
    /// updated bundle, mirroring how the original dashboard re-reads
    /// connections on every visit.
    ///
    /// # Errors
    ///
    /// Propagates server-reported failures (403 means access revoked).
    pub async fn refresh_connections(
        &self,
        session: &SessionContext,
        mut bundle: TokenBundle,
    ) -> AppResult<TokenBundle> {
        bundle.tenants = self.server.get_connections(&bundle).await?;
        session.store_token(bundle.clone()).await;
        Ok(bundle)
    }

    async fn fresh_or_cleanup(
        &self,
        session: &SessionContext,
        bundle: TokenBundle,
    ) -> AppResult<TokenBundle> {
        match self.ensure_fresh(session, bundle).await {
            Ok(fresh) => Ok(fresh),
            Err(e) => {
                // A dead refresh token must not leave a stale local bundle
                // behind; clean up before surfacing the failure.
                warn!("refresh failed during sign-out, destroying local token: {e}");
                session.destroy_token().await;
                session.sign_out().await;
                Err(e)
            }
        }
    }

    async fn full_disconnect_cleanup(
        &self,
        session: &SessionContext,
        bundle: &TokenBundle,
    ) -> AppResult<()> {
        let user = user_from_bundle(bundle);
        session.destroy_token().await;
        if self.options.sign_out_on_full_disconnect {
            session.sign_out().await;
        }
        self.delete_account(user.as_deref()).await?;
        info!("last tenant disconnected, token destroyed");
        Ok(())
    }

    async fn delete_account(&self, external_user_id: Option<&str>) -> AppResult<()> {
        if let Some(id) = external_user_id {
            self.users.delete_user(id).await?;
        }
        Ok(())
    }
}

/// External user id for the account tied to this bundle's ID token, when
/// one can still be derived.
fn user_from_bundle(bundle: &TokenBundle) -> Option<String> {
    bundle
        .id_token
        .as_deref()
        .and_then(|t| auth::user_from_id_token(t).ok())
        .map(|u| u.external_user_id)
}

async fn signed_in_user_id(session: &SessionContext) -> Option<String> {
    session
        .signed_in()
        .await
        .map(|principal| principal.external_user_id)
}
