// ABOUTME: Dashboard and landing route handlers
// ABOUTME: Resolves the effective tenant and renders organisation/account/contact data
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Dashboard routes.

use super::{request_session, with_session_cookie, AppResources};
use crate::errors::AppError;
use crate::tenants;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Query parameters for the dashboard.
#[derive(Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    tenant_id: Option<Uuid>,
}

/// Dashboard routes.
pub struct DashboardRoutes;

impl DashboardRoutes {
    /// Create the dashboard routes.
    pub fn routes(resources: Arc<AppResources>) -> Router {
        Router::new()
            .route("/", get(Self::handle_landing))
            .route("/dashboard", get(Self::handle_dashboard))
            .with_state(resources)
    }

    /// Landing page: signed-in status only.
    async fn handle_landing(
        State(resources): State<Arc<AppResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let (session, cookie) = request_session(&headers, &resources).await;

        let body = match session.signed_in().await {
            Some(principal) => json!({
                "signed_in": true,
                "email": principal.email,
                "name": principal.name,
            }),
            None => json!({ "signed_in": false }),
        };

        with_session_cookie(Json(body).into_response(), cookie)
    }

    /// Dashboard: refresh the token if expired, resolve the effective
    /// tenant and fetch the remote records. A 403 from the accounting
    /// API means tenant access was revoked; redirect to re-authorize.
    async fn handle_dashboard(
        State(resources): State<Arc<AppResources>>,
        headers: HeaderMap,
        Query(params): Query<DashboardQuery>,
    ) -> Result<Response, AppError> {
        let (session, cookie) = request_session(&headers, &resources).await;

        let bundle = match resources.flow.current_bundle(&session).await {
            Ok(bundle) => bundle,
            Err(AppError::NotSignedIn) => {
                return with_session_cookie(Redirect::to("/login").into_response(), cookie);
            }
            Err(e) => return Err(e),
        };

        // Re-read the authorized tenants: connections can change behind
        // our back from the platform's side.
        let bundle = match resources.flow.refresh_connections(&session, bundle).await {
            Ok(bundle) => bundle,
            Err(e) if e.is_remote_status(403) => {
                return with_session_cookie(Redirect::to("/login").into_response(), cookie);
            }
            Err(e) => return Err(e),
        };

        let Some(tenant_id) = tenants::resolve_tenant(&session, &bundle, params.tenant_id).await
        else {
            let body = json!({
                "no_tenants": true,
                "message": "no organisations are connected to this account",
            });
            return with_session_cookie(Json(body).into_response(), cookie);
        };

        let data = match resources
            .accounting
            .dashboard_data(&bundle.access_token, tenant_id)
            .await
        {
            Ok(data) => data,
            Err(e) if e.is_remote_status(403) => {
                // Current tenant was disconnected from the app remotely.
                return with_session_cookie(Redirect::to("/login").into_response(), cookie);
            }
            Err(e) => return Err(e),
        };

        with_session_cookie(Json(data).into_response(), cookie)
    }
}
