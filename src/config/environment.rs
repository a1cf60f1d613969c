// ABOUTME: Environment configuration for deployment-specific settings
// ABOUTME: Loads server port, database URL and flow options from environment variables
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Server configuration loaded from the environment.

use crate::config::oauth::OauthConfig;
use crate::errors::{AppError, AppResult};
use crate::oauth::flow::FlowOptions;
use std::env;

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// OAuth client settings
    pub oauth: OauthConfig,
    /// Flow behavior switches
    pub flow: FlowOptions,
}

/// Database settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables, applying defaults
    /// suitable for local development.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when a variable is present but
    /// unparseable.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|e| AppError::Config(format!("invalid HTTP_PORT: {e}")))?,
            Err(_) => 8080,
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/users.db".to_owned()),
        };

        let flow = FlowOptions {
            sign_out_on_full_disconnect: env_flag("FLOW_SIGN_OUT_ON_FULL_DISCONNECT", true),
            delete_account_on_partial_disconnect: env_flag(
                "FLOW_DELETE_ACCOUNT_ON_PARTIAL_DISCONNECT",
                true,
            ),
        };

        Ok(Self {
            http_port,
            database,
            oauth: OauthConfig::from_env(),
            flow,
        })
    }

    /// One-line summary for startup logging. Never includes secrets.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} oauth_client_id={}",
            self.http_port, self.database.url, self.oauth.client_id
        )
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name).map_or(default, |v| v == "1" || v.eq_ignore_ascii_case("true"))
}
