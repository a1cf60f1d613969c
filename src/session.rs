// ABOUTME: Session-scoped storage for tokens, anti-forgery state and tenant selection
// ABOUTME: Replaces process-wide token utilities with per-session context objects
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Session state.
//!
//! Each browser session owns exactly one [`SessionContext`], looked up
//! through the [`SessionRegistry`] by the session-id cookie. Within one
//! session writes are last-write-wins: the anti-forgery state written by
//! the most recent login attempt is the only one a callback can match.

use crate::models::{LocalUser, TokenBundle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The signed-in principal established after a successful callback.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Email claim of the signed-in user
    pub email: String,
    /// Full display name
    pub name: String,
    /// External user id the local account is keyed by
    pub external_user_id: String,
}

impl Principal {
    /// Build the session principal from a validated local user record.
    #[must_use]
    pub fn from_user(user: &LocalUser) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            external_user_id: user.external_user_id.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    pending_state: Option<String>,
    token: Option<TokenBundle>,
    tenant_id: Option<Uuid>,
    principal: Option<Principal>,
}

/// Storage scoped to one logical session.
///
/// Mutated only by the flow controller and the tenant resolver; the flow
/// is strictly sequential per session, so interior locking is only there
/// to make the handlers' shared references safe.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: RwLock<SessionState>,
}

impl SessionContext {
    /// Create an empty session context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the anti-forgery state for a freshly initiated login,
    /// replacing any earlier pending attempt.
    pub async fn store_state(&self, value: String) {
        self.state.write().await.pending_state = Some(value);
    }

    /// Consume the pending anti-forgery state. The state is single-use:
    /// after this call a second callback finds nothing to match.
    pub async fn take_state(&self) -> Option<String> {
        self.state.write().await.pending_state.take()
    }

    /// Store the token bundle.
    pub async fn store_token(&self, bundle: TokenBundle) {
        self.state.write().await.token = Some(bundle);
    }

    /// The currently stored token bundle, if any.
    pub async fn stored_token(&self) -> Option<TokenBundle> {
        self.state.read().await.token.clone()
    }

    /// Destroy the stored token bundle and the tenant selection.
    pub async fn destroy_token(&self) {
        let mut state = self.state.write().await;
        state.token = None;
        state.tenant_id = None;
    }

    /// Remember the current tenant.
    pub async fn store_tenant_id(&self, id: Uuid) {
        self.state.write().await.tenant_id = Some(id);
    }

    /// The current tenant, if one has been selected.
    pub async fn current_tenant_id(&self) -> Option<Uuid> {
        self.state.read().await.tenant_id
    }

    /// Establish the local authenticated session.
    pub async fn sign_in(&self, principal: Principal) {
        self.state.write().await.principal = Some(principal);
    }

    /// End the local authenticated session.
    pub async fn sign_out(&self) {
        self.state.write().await.principal = None;
    }

    /// The signed-in principal, if the session is authenticated.
    pub async fn signed_in(&self) -> Option<Principal> {
        self.state.read().await.principal.clone()
    }
}

/// Maps session ids (the `sid` cookie) to their contexts.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionContext>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the context for a session id, creating it on first sight.
    pub async fn session(&self, id: Uuid) -> Arc<SessionContext> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id)
            .or_insert_with(|| Arc::new(SessionContext::new()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_is_single_use() {
        let session = SessionContext::new();
        session.store_state("s1".into()).await;

        assert_eq!(session.take_state().await.as_deref(), Some("s1"));
        assert_eq!(session.take_state().await, None);
    }

    #[tokio::test]
    async fn test_latest_login_attempt_wins() {
        let session = SessionContext::new();
        session.store_state("first".into()).await;
        session.store_state("second".into()).await;

        assert_eq!(session.take_state().await.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_destroy_token_clears_tenant_selection() {
        let session = SessionContext::new();
        session
            .store_token(TokenBundle {
                access_token: "at".into(),
                refresh_token: "rt".into(),
                id_token: None,
                expires_at: chrono::Utc::now(),
                tenants: vec![],
            })
            .await;
        session.store_tenant_id(Uuid::new_v4()).await;

        session.destroy_token().await;
        assert!(session.stored_token().await.is_none());
        assert!(session.current_tenant_id().await.is_none());
    }

    #[tokio::test]
    async fn test_registry_returns_same_context() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();

        let a = registry.session(id).await;
        a.store_state("pending".into()).await;

        let b = registry.session(id).await;
        assert_eq!(b.take_state().await.as_deref(), Some("pending"));
    }
}
