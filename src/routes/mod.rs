// ABOUTME: Route module organization for the HTTP endpoints
// ABOUTME: Wires shared resources, session cookies and the per-domain routers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! HTTP surface.
//!
//! | Route           | Effect                                                        |
//! |-----------------|---------------------------------------------------------------|
//! | GET /login      | redirect to the authorize URL with fresh anti-forgery state   |
//! | GET /callback   | exchange code, validate tokens, establish session             |
//! | GET /disconnect | remove the current tenant, or end the session if none remain  |
//! | GET /revoke     | revoke the token, end the session                             |
//! | GET /dashboard  | resolve tenant, fetch organisation/accounts/contacts          |
//! | GET /           | landing with signed-in status                                 |

pub mod auth;
pub mod dashboard;

use crate::accounting::AccountingApi;
use crate::config::environment::ServerConfig;
use crate::errors::{AppError, AppResult};
use crate::oauth::flow::AuthFlow;
use crate::session::{SessionContext, SessionRegistry};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Cookie carrying the session id.
const SESSION_COOKIE: &str = "sid";

/// Shared state for all route handlers.
pub struct AppResources {
    /// Server configuration
    pub config: ServerConfig,
    /// Authorization flow controller
    pub flow: AuthFlow,
    /// Session-id to session-context mapping
    pub sessions: SessionRegistry,
    /// Remote accounting API client
    pub accounting: AccountingApi,
}

/// Compose the full application router.
#[must_use]
pub fn router(resources: Arc<AppResources>) -> Router {
    Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(dashboard::DashboardRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
}

/// The request's session context plus, for a fresh session, the
/// `Set-Cookie` value that binds the browser to it.
pub(crate) async fn request_session(
    headers: &HeaderMap,
    resources: &AppResources,
) -> (Arc<SessionContext>, Option<String>) {
    if let Some(id) = cookie_session_id(headers) {
        return (resources.sessions.session(id).await, None);
    }

    let id = Uuid::new_v4();
    let session = resources.sessions.session(id).await;
    let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
    (session, Some(cookie))
}

/// Attach a freshly minted session cookie to a response.
pub(crate) fn with_session_cookie(
    mut response: Response,
    cookie: Option<String>,
) -> AppResult<Response> {
    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::Config(format!("invalid session cookie: {e}")))?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

fn cookie_session_id(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE)
            .then(|| Uuid::parse_str(value).ok())
            .flatten()
    })
}
