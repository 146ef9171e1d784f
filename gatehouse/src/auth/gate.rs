//! HTTP-method gating for sign-out endpoints.

use axum::http::Method;

use crate::scopes::ScopeConfig;

/// Validates an incoming sign-out request's HTTP method against the scope's
/// configured allowed set, before any deauthentication happens.
///
/// A disallowed method must leave authentication state unchanged - callers
/// check the gate first and surface a rejected request as an unmatched route,
/// never reaching [`AuthenticationManager::deauthenticate`](crate::auth::AuthenticationManager::deauthenticate).
pub struct SignOutGate;

impl SignOutGate {
    /// True iff `method` is a member of the scope's `sign_out_via` set.
    pub fn is_allowed(scope: &ScopeConfig, method: &Method) -> bool {
        scope.sign_out_via().contains(method)
    }
}
