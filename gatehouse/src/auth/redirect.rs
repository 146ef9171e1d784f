//! Pending-redirect capture and single-use redemption.
//!
//! When an unauthenticated request hits a scope-protected resource, the
//! destination is recorded so the client can resume there after signing in.
//! At most one destination is stored per scope; a later denial overwrites an
//! earlier one (last write wins). Requests flagged as programmatic (XHR-style)
//! never create a pending redirect.

use serde_json::Value;
use tracing::trace;

use crate::{errors::Result, scopes::ScopeConfig, session::SessionStore};

/// Captures and redeems a single pending destination URL for one scope.
pub struct RedirectTracker<'a> {
    scope: &'a ScopeConfig,
    session: &'a dyn SessionStore,
}

impl<'a> RedirectTracker<'a> {
    pub fn new(scope: &'a ScopeConfig, session: &'a dyn SessionStore) -> Self {
        Self { scope, session }
    }

    /// Store `url` as the scope's pending redirect, overwriting any previous
    /// value. No-op for programmatic requests: no state changes at all.
    pub fn record(&self, url: &str, programmatic: bool) -> Result<()> {
        if programmatic {
            trace!(scope = self.scope.name(), url, "programmatic request, not recording redirect");
            return Ok(());
        }

        trace!(scope = self.scope.name(), url, "recording pending redirect");
        self.session
            .set(&self.scope.pending_redirect_key(), Value::String(url.to_string()))
    }

    /// Return and clear the pending destination. Single use: a second call
    /// returns the scope's default post-sign-in path.
    pub fn consume(&self) -> Result<String> {
        let key = self.scope.pending_redirect_key();
        let stored = self.session.get(&key)?;
        self.session.delete(&key)?;

        match stored {
            Some(Value::String(url)) => Ok(url),
            // Absent or unreadable: fall back to the configured default
            _ => Ok(self.scope.after_sign_in_path().to_string()),
        }
    }

    /// The currently stored destination, without consuming it.
    pub fn peek(&self) -> Result<Option<String>> {
        Ok(match self.session.get(&self.scope.pending_redirect_key())? {
            Some(Value::String(url)) => Some(url),
            _ => None,
        })
    }
}
