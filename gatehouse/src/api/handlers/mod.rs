//! Axum route handlers for the scope endpoints.

pub mod account;
pub mod sessions;

use std::sync::Arc;

use crate::{
    AppState,
    errors::{Error, Result},
    scopes::ScopeConfig,
};

/// Look up the scope named in the request path.
///
/// The path segment is client input, so an unregistered scope is an unmatched
/// route (404), not the internal misconfiguration that
/// [`ScopeRegistry::get`](crate::scopes::ScopeRegistry::get) reports.
pub(crate) fn scope_or_not_found<'a>(state: &'a AppState, scope: &str) -> Result<&'a Arc<ScopeConfig>> {
    state.registry.get(scope).map_err(|_| Error::NotFound {
        resource: format!("Scope '{scope}'"),
    })
}
