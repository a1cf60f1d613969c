// ABOUTME: OAuth client configuration for the accounting platform's authorization server
// ABOUTME: Loads client credentials, redirect URI, scopes and endpoint URLs from environment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! OAuth client configuration.

use std::env;
use tracing::{info, warn};

/// Configuration for the `OAuth2` client adapter.
#[derive(Debug, Clone, Default)]
pub struct OauthConfig {
    /// OAuth client id; also the expected ID-token audience
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the platform
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Authorization endpoint
    pub auth_url: String,
    /// Token endpoint (exchange and refresh)
    pub token_url: String,
    /// Revocation endpoint
    pub revoke_url: String,
    /// Tenant connections endpoint
    pub connections_url: String,
    /// Base URL of the accounting API
    pub api_base_url: String,
}

const DEFAULT_SCOPES: &str =
    "openid profile email accounting.settings accounting.contacts offline_access";

impl OauthConfig {
    /// Load OAuth configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
        let identity_url = env::var("LEDGER_IDENTITY_URL")
            .unwrap_or_else(|_| "https://identity.ledger.example".to_owned());
        let api_url =
            env::var("LEDGER_API_URL").unwrap_or_else(|_| "https://api.ledger.example".to_owned());

        Self {
            client_id: env::var("LEDGER_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("LEDGER_CLIENT_SECRET").unwrap_or_default(),
            redirect_uri: env::var("LEDGER_REDIRECT_URI")
                .unwrap_or_else(|_| format!("{base_url}/callback")),
            scopes: parse_scopes(
                &env::var("LEDGER_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_owned()),
            ),
            auth_url: env::var("LEDGER_AUTH_URL")
                .unwrap_or_else(|_| format!("{identity_url}/connect/authorize")),
            token_url: env::var("LEDGER_TOKEN_URL")
                .unwrap_or_else(|_| format!("{identity_url}/connect/token")),
            revoke_url: env::var("LEDGER_REVOKE_URL")
                .unwrap_or_else(|_| format!("{identity_url}/connect/revocation")),
            connections_url: env::var("LEDGER_CONNECTIONS_URL")
                .unwrap_or_else(|_| format!("{api_url}/connections")),
            api_base_url: env::var("LEDGER_API_BASE_URL")
                .unwrap_or_else(|_| format!("{api_url}/accounting")),
        }
    }

    /// Validate credentials and log diagnostics without revealing values.
    /// Returns false when the client cannot work as configured.
    #[must_use]
    pub fn validate_and_log(&self) -> bool {
        if self.client_id.is_empty() {
            warn!("LEDGER_CLIENT_ID is missing or empty");
            return false;
        }
        if self.client_secret.is_empty() {
            warn!("LEDGER_CLIENT_SECRET is missing or empty");
            return false;
        }

        info!(
            "oauth client configured: client_id={}, secret_length={}, scopes={}",
            self.client_id,
            self.client_secret.len(),
            self.scopes.join(" ")
        );
        true
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}
