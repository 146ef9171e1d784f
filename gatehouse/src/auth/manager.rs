//! Per-scope authenticated-principal state for the current session.
//!
//! The manager is a cheap per-request value assembled from the registry, the
//! client's session, the principal resolver, and the sign-out breadth policy.
//! The policy is an explicit immutable input captured at construction, so the
//! cascade behavior is a pure function of (current session, policy) - it is
//! never read from ambient process state mid-request.

use tracing::debug;

use crate::{
    auth::{
        principal::{Principal, PrincipalRef, PrincipalResolver},
        redirect::RedirectTracker,
    },
    config::Config,
    errors::{Error, Result},
    scopes::ScopeRegistry,
    session::SessionStore,
};

/// Whether a sign-out affects one scope or cascades to all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutBreadth {
    /// Sign-out clears only the triggering scope's slot
    SingleScope,
    /// Sign-out clears every registered scope's slot
    AllScopes,
}

impl SignOutBreadth {
    /// Read the process-wide `sign_out_all_scopes` toggle. Called at sign-out
    /// handling time, once per request.
    pub fn from_config(config: &Config) -> Self {
        if config.sign_out_all_scopes {
            SignOutBreadth::AllScopes
        } else {
            SignOutBreadth::SingleScope
        }
    }
}

/// Holds per-scope authenticated-principal state for the current session.
///
/// Side effects are confined to the session store; no network calls.
pub struct AuthenticationManager<'a> {
    registry: &'a ScopeRegistry,
    session: &'a dyn SessionStore,
    resolver: &'a dyn PrincipalResolver,
    breadth: SignOutBreadth,
}

impl<'a> AuthenticationManager<'a> {
    pub fn new(
        registry: &'a ScopeRegistry,
        session: &'a dyn SessionStore,
        resolver: &'a dyn PrincipalResolver,
        breadth: SignOutBreadth,
    ) -> Self {
        Self {
            registry,
            session,
            resolver,
            breadth,
        }
    }

    /// True iff the session holds a valid, resolvable principal reference for
    /// the scope.
    pub fn is_authenticated(&self, scope: &str) -> Result<bool> {
        Ok(self.current_principal(scope)?.is_some())
    }

    /// Resolve the scope's stored principal, if any.
    ///
    /// A stored reference that no longer resolves (record deleted mid-session,
    /// kind unknown) clears the slot lazily and reports unauthenticated - the
    /// request itself never fails over a stale reference.
    pub fn current_principal(&self, scope: &str) -> Result<Option<Principal>> {
        let scope_config = self.registry.get(scope)?;
        let key = scope_config.principal_key();

        let Some(stored) = self.session.get(&key)? else {
            return Ok(None);
        };

        let reference: PrincipalRef = match serde_json::from_value(stored) {
            Ok(reference) => reference,
            Err(_) => {
                debug!(scope, "unreadable principal reference in session, clearing slot");
                self.session.delete(&key)?;
                return Ok(None);
            }
        };

        match self.resolver.resolve(&reference)? {
            Some(principal) => Ok(Some(principal)),
            None => {
                debug!(scope, %reference, "stored principal no longer resolves, clearing slot");
                self.session.delete(&key)?;
                Ok(None)
            }
        }
    }

    /// Sign a principal into `scope` and redeem its pending redirect.
    ///
    /// Writes the reference into the scope's session slot without touching any
    /// other scope, then consumes the scope's pending redirect. Returns the
    /// redeemed destination, or the scope's default post-sign-in path when
    /// none is pending.
    pub fn authenticate(&self, scope: &str, reference: &PrincipalRef) -> Result<String> {
        let scope_config = self.registry.get(scope)?;

        let value = serde_json::to_value(reference).map_err(|e| Error::Internal {
            operation: format!("serialize principal reference: {e}"),
        })?;
        self.session.set(&scope_config.principal_key(), value)?;

        debug!(scope, principal = %reference, "authenticated");

        RedirectTracker::new(scope_config, self.session).consume()
    }

    /// Sign out of `scope`. Under [`SignOutBreadth::AllScopes`] this clears
    /// the principal slot of every registered scope; otherwise only the
    /// triggering scope's. Returns the scope's default post-sign-out path.
    pub fn deauthenticate(&self, scope: &str) -> Result<String> {
        let scope_config = self.registry.get(scope)?;

        match self.breadth {
            SignOutBreadth::AllScopes => {
                for other in self.registry.iter() {
                    self.session.delete(&other.principal_key())?;
                }
                debug!(scope, "deauthenticated all scopes");
            }
            SignOutBreadth::SingleScope => {
                self.session.delete(&scope_config.principal_key())?;
                debug!(scope, "deauthenticated");
            }
        }

        Ok(scope_config.after_sign_out_path().to_string())
    }

    /// Gate for scope-protected resources.
    ///
    /// Returns the current principal, or records the denied destination
    /// (skipped for programmatic requests) and reports unauthenticated.
    pub fn require_authenticated(&self, scope: &str, requested_path: &str, programmatic: bool) -> Result<Principal> {
        if let Some(principal) = self.current_principal(scope)? {
            return Ok(principal);
        }

        let scope_config = self.registry.get(scope)?;
        RedirectTracker::new(scope_config, self.session).record(requested_path, programmatic)?;

        Err(Error::Unauthenticated {
            scope: Some(scope.to_string()),
        })
    }
}
