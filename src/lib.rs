// ABOUTME: Main library entry point for the ledgerlink sample application
// ABOUTME: Demonstrates OAuth2 sign-up, token lifecycle and accounting API calls
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # ledgerlink
//!
//! A sample web application demonstrating `OAuth2` login against a
//! third-party accounting platform: authorization redirect, code
//! callback and exchange, session-scoped token storage, expiry-driven
//! refresh, tenant selection, dashboard API calls, and token
//! revocation/disconnection on sign-out.
//!
//! ## Architecture
//!
//! - **`session`**: per-session storage of the token bundle, anti-forgery
//!   state and current tenant
//! - **`auth`**: ID-token and access-token validation (signature
//!   verification delegated)
//! - **`oauth`**: the authorization-server adapter and the end-to-end
//!   flow controller
//! - **`tenants`**: effective-tenant resolution for API calls
//! - **`accounting`**: opaque client for the remote accounting API
//! - **`database`**: local user accounts projected from ID-token claims
//! - **`routes`**: the axum HTTP surface
//!
//! ## Example
//!
//! ```rust,no_run
//! use ledgerlink::config::environment::ServerConfig;
//! use ledgerlink::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("ledgerlink configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Remote accounting API client
pub mod accounting;

/// ID-token and access-token validation
pub mod auth;

/// Configuration management
pub mod config;

/// Local user storage
pub mod database;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Core data model
pub mod models;

/// `OAuth2` client adapter and flow controller
pub mod oauth;

/// HTTP routes
pub mod routes;

/// Session-scoped state
pub mod session;

/// Tenant resolution
pub mod tenants;
