// ABOUTME: HTTP OAuth2 client adapter for the accounting platform's authorization server
// ABOUTME: Implements code exchange, refresh, revocation and tenant connection management
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! HTTP implementation of [`AuthorizationServer`].

use super::AuthorizationServer;
use crate::config::oauth::OauthConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, TokenBundle};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

/// `OAuth2` client for the accounting platform.
pub struct OauthClient {
    config: OauthConfig,
    client: reqwest::Client,
}

impl OauthClient {
    /// Create a client for the configured authorization server.
    #[must_use]
    pub fn new(config: OauthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn bundle_from_response(response: TokenResponse, tenants: Vec<Tenant>) -> TokenBundle {
        let expires_at =
            Utc::now() + Duration::seconds(i64::try_from(response.expires_in).unwrap_or(1800));

        TokenBundle {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            expires_at,
            tenants,
        }
    }
}

#[async_trait]
impl AuthorizationServer for OauthClient {
    fn build_login_uri(&self, state: &str) -> AppResult<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AppError::Config(format!("invalid authorization URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }

    async fn request_access_token(&self, code: &str) -> AppResult<TokenBundle> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExchangeFailed(format!("status {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let mut bundle = Self::bundle_from_response(token, Vec::new());
        bundle.tenants = self.get_connections(&bundle).await?;

        Ok(bundle)
    }

    async fn refresh_access_token(&self, bundle: &TokenBundle) -> AppResult<TokenBundle> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", bundle.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RefreshFailed(format!("status {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;

        // Refresh rotates the access/refresh pair; the tenant list and any
        // ID token from the original sign-in stay with the bundle.
        let mut refreshed = Self::bundle_from_response(token, bundle.tenants.clone());
        if refreshed.id_token.is_none() {
            refreshed.id_token.clone_from(&bundle.id_token);
        }

        Ok(refreshed)
    }

    async fn revoke_access_token(&self, bundle: &TokenBundle) -> AppResult<()> {
        // RFC 7009: the server answers 200 even for already-revoked tokens,
        // which keeps this operation idempotent.
        let params = [("token", bundle.refresh_token.as_str())];

        let response = self
            .client
            .post(&self.config.revoke_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    async fn get_connections(&self, bundle: &TokenBundle) -> AppResult<Vec<Tenant>> {
        let response = self
            .client
            .get(&self.config.connections_url)
            .bearer_auth(&bundle.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
            });
        }

        let connections: Vec<ConnectionRecord> = response.json().await?;
        Ok(connections
            .into_iter()
            .map(|c| Tenant {
                tenant_id: c.tenant_id,
                tenant_name: c.tenant_name,
                tenant_type: c.tenant_type,
            })
            .collect())
    }

    async fn delete_connection(&self, bundle: &TokenBundle, tenant_id: Uuid) -> AppResult<()> {
        let url = format!("{}/{tenant_id}", self.config.connections_url);

        let response = self
            .client
            .delete(url)
            .bearer_auth(&bundle.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::RemoteApi {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    id_token: Option<String>,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionRecord {
    tenant_id: Uuid,
    #[serde(default)]
    tenant_name: Option<String>,
    #[serde(default)]
    tenant_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OauthConfig {
        OauthConfig {
            client_id: "client-1".into(),
            client_secret: "secret".into(),
            redirect_uri: "https://app.example/callback".into(),
            scopes: vec!["openid".into(), "accounting.settings".into()],
            auth_url: "https://login.example/identity/connect/authorize".into(),
            token_url: "https://login.example/connect/token".into(),
            revoke_url: "https://login.example/connect/revocation".into(),
            connections_url: "https://api.example/connections".into(),
            api_base_url: "https://api.example/api.xro/2.0".into(),
        }
    }

    #[test]
    fn test_login_uri_embeds_state_and_scopes() {
        let client = OauthClient::new(config());
        let uri = client.build_login_uri("state-123").unwrap();

        let parsed = Url::parse(&uri).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("client_id".into(), "client-1".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("state".into(), "state-123".into())));
        assert!(pairs.contains(&("scope".into(), "openid accounting.settings".into())));
    }

    #[test]
    fn test_login_uri_rejects_bad_auth_url() {
        let mut bad = config();
        bad.auth_url = "not a url".into();
        let client = OauthClient::new(bad);

        assert!(matches!(
            client.build_login_uri("s"),
            Err(AppError::Config(_))
        ));
    }
}
