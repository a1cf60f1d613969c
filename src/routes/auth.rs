// ABOUTME: Authorization route handlers for login, callback, disconnect and revoke
// ABOUTME: Maps flow outcomes onto redirects and plain-text failure responses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Authorization routes.

use super::{request_session, with_session_cookie, AppResources};
use crate::errors::AppError;
use crate::oauth::flow::DisconnectOutcome;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters of the authorization callback.
#[derive(Deserialize)]
struct CallbackQuery {
    code: String,
    state: String,
}

/// Authorization routes.
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the authorization routes.
    pub fn routes(resources: Arc<AppResources>) -> Router {
        Router::new()
            .route("/login", get(Self::handle_login))
            .route("/callback", get(Self::handle_callback))
            .route("/disconnect", get(Self::handle_disconnect))
            .route("/revoke", get(Self::handle_revoke))
            .with_state(resources)
    }

    /// Start a login: store fresh anti-forgery state and redirect to the
    /// third-party authorize URL.
    async fn handle_login(
        State(resources): State<Arc<AppResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let (session, cookie) = request_session(&headers, &resources).await;

        let uri = resources.flow.begin_login(&session).await?;
        with_session_cookie(Redirect::to(&uri).into_response(), cookie)
    }

    /// Authorization callback: verify state, exchange the code, validate
    /// tokens, establish the session, then land on the dashboard.
    async fn handle_callback(
        State(resources): State<Arc<AppResources>>,
        headers: HeaderMap,
        Query(params): Query<CallbackQuery>,
    ) -> Result<Response, AppError> {
        let (session, cookie) = request_session(&headers, &resources).await;

        resources
            .flow
            .handle_callback(&session, &params.code, &params.state)
            .await?;

        with_session_cookie(Redirect::to("/dashboard").into_response(), cookie)
    }

    /// Remove the current tenant; ends the session when it was the last.
    /// With no stored token this is already-signed-out, not an error.
    async fn handle_disconnect(
        State(resources): State<Arc<AppResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let (session, cookie) = request_session(&headers, &resources).await;

        let destination = match resources.flow.disconnect(&session).await? {
            DisconnectOutcome::Partial { .. } => "/dashboard",
            DisconnectOutcome::Full | DisconnectOutcome::AlreadySignedOut => "/",
        };

        with_session_cookie(Redirect::to(destination).into_response(), cookie)
    }

    /// Revoke the token server-side and end the session. Safe to call
    /// repeatedly: a second invocation finds no token and redirects home.
    async fn handle_revoke(
        State(resources): State<Arc<AppResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let (session, cookie) = request_session(&headers, &resources).await;

        resources.flow.revoke(&session).await?;

        with_session_cookie(Redirect::to("/").into_response(), cookie)
    }
}
