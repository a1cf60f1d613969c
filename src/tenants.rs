// ABOUTME: Effective-tenant resolution for dashboard and API calls
// ABOUTME: Falls back from requested id to stored id to the first authorized tenant
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Tenant resolution.
//!
//! The current tenant id must always be a member of the bundle's tenant
//! list; resolution reassigns it whenever that invariant would break.

use crate::models::TokenBundle;
use crate::session::SessionContext;
use uuid::Uuid;

/// Resolve the effective tenant for subsequent API calls.
///
/// Precedence: an explicitly requested tenant that the bundle is
/// authorized for, then the previously stored current tenant if still
/// authorized, then the first tenant in the list. Whatever wins is
/// persisted as current. `None` means the bundle has no tenants at all,
/// a distinct condition the caller must handle instead of calling the
/// API.
pub async fn resolve_tenant(
    session: &SessionContext,
    bundle: &TokenBundle,
    requested: Option<Uuid>,
) -> Option<Uuid> {
    if let Some(id) = requested.filter(|id| bundle.tenant(*id).is_some()) {
        session.store_tenant_id(id).await;
        return Some(id);
    }

    let stored = session.current_tenant_id().await;
    if let Some(id) = stored.filter(|id| bundle.tenant(*id).is_some()) {
        return Some(id);
    }

    let first = bundle.tenants.first().map(|t| t.tenant_id)?;
    session.store_tenant_id(first).await;
    Some(first)
}
