// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Runs a scripted authorization + accounting server on an ephemeral port
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Form, Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use ledgerlink::config::oauth::OauthConfig;
use ledgerlink::database::UserStore;
use ledgerlink::models::Tenant;
use ledgerlink::oauth::client::OauthClient;
use ledgerlink::oauth::flow::{AuthFlow, FlowOptions};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const CLIENT_ID: &str = "client-1";

/// Mint an unsigned-but-well-formed JWT (signature verification is
/// delegated and disabled in the application under test).
pub fn make_jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signature = URL_SAFE_NO_PAD.encode(b"unverified");
    format!("{header}.{payload}.{signature}")
}

/// The identity the scripted server signs users in as.
pub fn id_token_claims(aud: &str) -> Value {
    json!({
        "aud": aud,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "sub": "u1",
        "sid": "sess-9",
        "email": "u@x.com",
        "name": "A B",
        "given_name": "A",
        "family_name": "B",
    })
}

pub fn access_token_claims(serial: usize) -> Value {
    json!({
        "exp": (Utc::now() + Duration::minutes(30)).timestamp(),
        "jti": format!("at-{serial}"),
    })
}

/// Mutable behavior and counters of the scripted platform.
pub struct PlatformState {
    /// Tenants the connections endpoint reports
    pub tenants: Mutex<Vec<Tenant>>,
    pub exchange_requests: AtomicUsize,
    pub refresh_requests: AtomicUsize,
    pub revoke_requests: AtomicUsize,
    pub fail_exchange: AtomicBool,
    pub fail_refresh: AtomicBool,
    /// When set, accounting endpoints answer 403
    pub revoke_api_access: AtomicBool,
    issued: AtomicUsize,
}

impl PlatformState {
    fn issue_serial(&self) -> usize {
        self.issued.fetch_add(1, Ordering::SeqCst)
    }
}

/// In-process authorization + accounting server for integration tests.
pub struct ScriptedPlatform {
    pub base_url: String,
    pub state: Arc<PlatformState>,
}

impl ScriptedPlatform {
    pub async fn spawn(tenants: Vec<Tenant>) -> Self {
        let state = Arc::new(PlatformState {
            tenants: Mutex::new(tenants),
            exchange_requests: AtomicUsize::new(0),
            refresh_requests: AtomicUsize::new(0),
            revoke_requests: AtomicUsize::new(0),
            fail_exchange: AtomicBool::new(false),
            fail_refresh: AtomicBool::new(false),
            revoke_api_access: AtomicBool::new(false),
            issued: AtomicUsize::new(0),
        });

        let router = Router::new()
            .route("/connect/token", post(handle_token))
            .route("/connect/revocation", post(handle_revocation))
            .route("/connections", get(handle_connections))
            .route("/connections/:tenant_id", delete(handle_delete_connection))
            .route("/accounting/organisations", get(handle_accounting))
            .route("/accounting/accounts", get(handle_accounting))
            .route("/accounting/contacts", get(handle_accounting))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn oauth_config(&self) -> OauthConfig {
        OauthConfig {
            client_id: CLIENT_ID.into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:8080/callback".into(),
            scopes: vec!["openid".into(), "accounting.settings".into()],
            auth_url: format!("{}/connect/authorize", self.base_url),
            token_url: format!("{}/connect/token", self.base_url),
            revoke_url: format!("{}/connect/revocation", self.base_url),
            connections_url: format!("{}/connections", self.base_url),
            api_base_url: format!("{}/accounting", self.base_url),
        }
    }

    pub fn client(&self) -> Arc<OauthClient> {
        Arc::new(OauthClient::new(self.oauth_config()))
    }

    pub fn flow(&self, users: Arc<UserStore>) -> AuthFlow {
        self.flow_with_options(users, FlowOptions::default())
    }

    pub fn flow_with_options(&self, users: Arc<UserStore>, options: FlowOptions) -> AuthFlow {
        AuthFlow::new(self.client(), users, CLIENT_ID, options)
    }
}

pub async fn user_store() -> (Arc<UserStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/users.db", dir.path().display());
    let store = UserStore::new(&url).await.unwrap();
    store.migrate().await.unwrap();
    (Arc::new(store), dir)
}

pub fn tenant(name: &str) -> Tenant {
    Tenant {
        tenant_id: Uuid::new_v4(),
        tenant_name: Some(name.to_owned()),
        tenant_type: Some("ORGANISATION".to_owned()),
    }
}

async fn handle_token(
    State(state): State<Arc<PlatformState>>,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let grant_type = params.get("grant_type").cloned().unwrap_or_default();

    let rejected = match grant_type.as_str() {
        "authorization_code" => {
            state.exchange_requests.fetch_add(1, Ordering::SeqCst);
            state.fail_exchange.load(Ordering::SeqCst)
        }
        "refresh_token" => {
            state.refresh_requests.fetch_add(1, Ordering::SeqCst);
            state.fail_refresh.load(Ordering::SeqCst)
        }
        _ => true,
    };

    if rejected {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant" })),
        );
    }

    let serial = state.issue_serial();
    let body = json!({
        "access_token": make_jwt(&access_token_claims(serial)),
        "refresh_token": format!("rt-{serial}"),
        "id_token": make_jwt(&id_token_claims(CLIENT_ID)),
        "expires_in": 1800,
        "token_type": "Bearer",
    });
    (StatusCode::OK, Json(body))
}

async fn handle_revocation(State(state): State<Arc<PlatformState>>) -> StatusCode {
    state.revoke_requests.fetch_add(1, Ordering::SeqCst);
    // RFC 7009: 200 even for tokens that were never (or are no longer) valid.
    StatusCode::OK
}

async fn handle_connections(State(state): State<Arc<PlatformState>>) -> Json<Value> {
    let tenants = state.tenants.lock().unwrap();
    let records: Vec<Value> = tenants
        .iter()
        .map(|t| {
            json!({
                "tenantId": t.tenant_id,
                "tenantName": t.tenant_name,
                "tenantType": t.tenant_type,
            })
        })
        .collect();
    Json(Value::Array(records))
}

async fn handle_delete_connection(
    State(state): State<Arc<PlatformState>>,
    Path(tenant_id): Path<Uuid>,
) -> StatusCode {
    let mut tenants = state.tenants.lock().unwrap();
    let before = tenants.len();
    tenants.retain(|t| t.tenant_id != tenant_id);

    if tenants.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    }
}

async fn handle_accounting(State(state): State<Arc<PlatformState>>) -> impl IntoResponse {
    if state.revoke_api_access.load(Ordering::SeqCst) {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" })));
    }
    (StatusCode::OK, Json(json!({ "records": [] })))
}
