// ABOUTME: Unified error taxonomy for the OAuth2 flow and HTTP surface
// ABOUTME: Maps each failure class to an HTTP status and plain-text response body
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Application error types.
//!
//! Forgery and token-validation failures are terminal for the current
//! request: they must be raised before any session state is mutated.
//! Exchange and refresh rejections mean the user has to re-authorize.
//! Network failures propagate as-is; nothing retries internally.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Unified error type for the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// The callback state did not match the pending login attempt.
    /// Never recoverable; the login must be restarted.
    #[error("cross-site request forgery detected: state parameter mismatch")]
    ForgeryDetected,

    /// An ID or access token failed validation. Never recoverable;
    /// the login must be restarted.
    #[error("token validation failed: {0}")]
    TokenValidation(String),

    /// The authorization server rejected the code exchange
    /// (invalid, expired or already-used code).
    #[error("authorization code exchange rejected: {0}")]
    ExchangeFailed(String),

    /// The authorization server rejected the refresh token
    /// (revoked or expired). Terminal; the caller must restart login.
    #[error("token refresh rejected: {0}")]
    RefreshFailed(String),

    /// An operation that requires a stored token found none.
    /// Callers redirect to re-authorize rather than failing.
    #[error("no token is stored for this session")]
    NotSignedIn,

    /// The remote API reported an HTTP error. 403 means the current
    /// tenant's access was revoked and callers must re-authorize.
    #[error("remote API returned status {status}")]
    RemoteApi {
        /// HTTP status reported by the remote service
        status: u16,
    },

    /// A transport-level failure talking to a remote service.
    /// Retrying is the caller's choice; nothing retries internally.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local user storage failure.
    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status this error maps to.
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::ForgeryDetected => StatusCode::FORBIDDEN,
            Self::TokenValidation(_) => StatusCode::UNAUTHORIZED,
            Self::ExchangeFailed(_) | Self::RefreshFailed(_) => StatusCode::BAD_GATEWAY,
            Self::NotSignedIn => StatusCode::UNAUTHORIZED,
            Self::RemoteApi { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Network(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the remote service reported the given status.
    #[must_use]
    pub const fn is_remote_status(&self, wanted: u16) -> bool {
        matches!(self, Self::RemoteApi { status } if *status == wanted)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Plain-text bodies: forgery and validation failures must not
        // redirect into the authenticated area.
        let status = self.http_status();
        let body = match &self {
            Self::ForgeryDetected => "cross-site request forgery detected".to_owned(),
            Self::TokenValidation(msg) => format!("token is not valid: {msg}"),
            Self::ExchangeFailed(_) | Self::RefreshFailed(_) => {
                "authorization was rejected, please sign in again".to_owned()
            }
            other => other.to_string(),
        };
        (status, body).into_response()
    }
}

/// Result type alias for convenience.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(AppError::ForgeryDetected.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::TokenValidation("aud mismatch".into()).http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::RefreshFailed("revoked".into()).http_status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::RemoteApi { status: 403 }.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_remote_status_matcher() {
        assert!(AppError::RemoteApi { status: 403 }.is_remote_status(403));
        assert!(!AppError::RemoteApi { status: 500 }.is_remote_status(403));
        assert!(!AppError::ForgeryDetected.is_remote_status(403));
    }
}
