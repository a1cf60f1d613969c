// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Splits environment/server settings from OAuth client configuration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Configuration management.

pub mod environment;
pub mod oauth;
