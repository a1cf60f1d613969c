// ABOUTME: Integration tests for the HTTP OAuth client adapter
// ABOUTME: Exercises exchange, refresh, revocation and connection management over the wire
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{tenant, ScriptedPlatform};
use ledgerlink::errors::AppError;
use ledgerlink::oauth::AuthorizationServer;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_exchange_populates_tenants() {
    let a = tenant("Org A");
    let b = tenant("Org B");
    let platform = ScriptedPlatform::spawn(vec![a.clone(), b.clone()]).await;
    let client = platform.client();

    let bundle = client.request_access_token("abc").await.unwrap();

    assert!(!bundle.access_token.is_empty());
    assert!(!bundle.refresh_token.is_empty());
    assert!(bundle.id_token.is_some());
    assert!(!bundle.is_expired());
    assert_eq!(bundle.tenants, vec![a, b]);
}

#[tokio::test]
async fn test_exchange_rejection_maps_to_exchange_failed() {
    let platform = ScriptedPlatform::spawn(vec![]).await;
    platform.state.fail_exchange.store(true, Ordering::SeqCst);
    let client = platform.client();

    let err = client.request_access_token("expired-code").await.unwrap_err();
    assert!(matches!(err, AppError::ExchangeFailed(_)));
}

#[tokio::test]
async fn test_refresh_rotates_tokens_and_keeps_tenants() {
    let platform = ScriptedPlatform::spawn(vec![tenant("Org A")]).await;
    let client = platform.client();

    let bundle = client.request_access_token("abc").await.unwrap();
    let refreshed = client.refresh_access_token(&bundle).await.unwrap();

    assert_ne!(refreshed.access_token, bundle.access_token);
    assert_ne!(refreshed.refresh_token, bundle.refresh_token);
    assert_eq!(refreshed.tenants, bundle.tenants);
    assert_eq!(platform.state.refresh_requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_refresh_rejection_maps_to_refresh_failed() {
    let platform = ScriptedPlatform::spawn(vec![]).await;
    let client = platform.client();

    let bundle = client.request_access_token("abc").await.unwrap();
    platform.state.fail_refresh.store(true, Ordering::SeqCst);

    let err = client.refresh_access_token(&bundle).await.unwrap_err();
    assert!(matches!(err, AppError::RefreshFailed(_)));
}

#[tokio::test]
async fn test_revoke_is_idempotent_server_side() {
    let platform = ScriptedPlatform::spawn(vec![]).await;
    let client = platform.client();

    let bundle = client.request_access_token("abc").await.unwrap();

    client.revoke_access_token(&bundle).await.unwrap();
    client.revoke_access_token(&bundle).await.unwrap();
    assert_eq!(platform.state.revoke_requests.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_delete_connection_leaves_other_tenants() {
    let a = tenant("Org A");
    let b = tenant("Org B");
    let platform = ScriptedPlatform::spawn(vec![a.clone(), b.clone()]).await;
    let client = platform.client();

    let bundle = client.request_access_token("abc").await.unwrap();
    client.delete_connection(&bundle, a.tenant_id).await.unwrap();

    let remaining = client.get_connections(&bundle).await.unwrap();
    assert_eq!(remaining, vec![b]);
}

#[tokio::test]
async fn test_delete_unknown_connection_reports_remote_status() {
    let platform = ScriptedPlatform::spawn(vec![]).await;
    let client = platform.client();

    let bundle = client.request_access_token("abc").await.unwrap();
    let err = client
        .delete_connection(&bundle, uuid::Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RemoteApi { status: 404 }));
}
