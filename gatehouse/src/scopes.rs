//! Scope registry: immutable per-scope configuration resolved once at startup.
//!
//! A scope is an independently authenticated principal category ("user",
//! "admin", ...) with its own session slot, default destinations, and sign-out
//! method set. The registry is the single source of truth for how a scope's
//! entries are laid out in the shared session store: key derivation lives
//! here, as a documented contract, not as string concatenation in callers.

use axum::http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    config::Config,
    errors::{Error, Result},
};

/// Immutable configuration for one authentication scope.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    name: String,
    key_prefix: String,
    after_sign_in_path: String,
    after_sign_out_path: String,
    sign_out_via: Vec<Method>,
    scoped_views: Option<bool>,
}

impl ScopeConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destination after a successful sign-in when no pending redirect exists
    pub fn after_sign_in_path(&self) -> &str {
        &self.after_sign_in_path
    }

    /// Destination after sign-out
    pub fn after_sign_out_path(&self) -> &str {
        &self.after_sign_out_path
    }

    /// HTTP methods accepted by this scope's sign-out endpoint
    pub fn sign_out_via(&self) -> &[Method] {
        &self.sign_out_via
    }

    /// Per-scope override of the global scoped-views default
    pub fn scoped_views(&self) -> Option<bool> {
        self.scoped_views
    }

    /// Session key holding this scope's principal reference.
    ///
    /// Storage layout contract: `<prefix>.principal`, where the prefix is the
    /// configured `key_prefix` (scope name by default).
    pub fn principal_key(&self) -> String {
        format!("{}.principal", self.key_prefix)
    }

    /// Session key holding this scope's pending redirect.
    ///
    /// Storage layout contract: `<prefix>.return_to`.
    pub fn pending_redirect_key(&self) -> String {
        format!("{}.return_to", self.key_prefix)
    }
}

/// Lookup table of all configured scopes, populated once at startup.
///
/// Absence of a scope that a route expects is a configuration error caught by
/// [`ScopeRegistry::from_config`] / [`Config::validate`](crate::config::Config::validate),
/// not a runtime failure.
#[derive(Debug)]
pub struct ScopeRegistry {
    scopes: HashMap<String, Arc<ScopeConfig>>,
}

impl ScopeRegistry {
    /// Build the registry from configuration. Fatal on invalid scope
    /// definitions - the server must not start with a broken scope table.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut scopes = HashMap::with_capacity(config.scopes.len());
        for (name, settings) in &config.scopes {
            let scope = ScopeConfig {
                name: name.clone(),
                key_prefix: settings.key_prefix.clone().unwrap_or_else(|| name.clone()),
                after_sign_in_path: settings.after_sign_in_path.clone(),
                after_sign_out_path: settings.after_sign_out_path.clone(),
                sign_out_via: settings.sign_out_via.iter().map(|m| m.as_method()).collect(),
                scoped_views: settings.scoped_views,
            };
            scopes.insert(name.clone(), Arc::new(scope));
        }

        Ok(Self { scopes })
    }

    /// Look up a scope by name.
    pub fn get(&self, scope: &str) -> Result<&Arc<ScopeConfig>> {
        self.scopes.get(scope).ok_or_else(|| Error::UnknownScope {
            scope: scope.to_string(),
        })
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.scopes.contains_key(scope)
    }

    /// All registered scopes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ScopeConfig>> {
        self.scopes.values()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScopeSettings;
    use std::collections::BTreeMap;

    fn two_scope_config() -> Config {
        Config {
            scopes: BTreeMap::from([
                ("user".to_string(), ScopeSettings::default()),
                (
                    "admin".to_string(),
                    ScopeSettings {
                        key_prefix: Some("admin_area".to_string()),
                        after_sign_in_path: "/admin".to_string(),
                        ..Default::default()
                    },
                ),
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn test_key_derivation_uses_configured_prefix() {
        let registry = ScopeRegistry::from_config(&two_scope_config()).unwrap();

        let user = registry.get("user").unwrap();
        assert_eq!(user.principal_key(), "user.principal");
        assert_eq!(user.pending_redirect_key(), "user.return_to");

        let admin = registry.get("admin").unwrap();
        assert_eq!(admin.principal_key(), "admin_area.principal");
        assert_eq!(admin.pending_redirect_key(), "admin_area.return_to");
    }

    #[test]
    fn test_unknown_scope_is_an_error() {
        let registry = ScopeRegistry::from_config(&two_scope_config()).unwrap();
        let err = registry.get("moderator").unwrap_err();
        assert!(matches!(err, Error::UnknownScope { scope } if scope == "moderator"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let config = Config {
            scopes: BTreeMap::new(),
            ..Default::default()
        };
        assert!(ScopeRegistry::from_config(&config).is_err());
    }

    #[test]
    fn test_sign_out_via_converted_to_methods() {
        use crate::config::SignOutMethod;

        let mut config = two_scope_config();
        config.scopes.get_mut("user").unwrap().sign_out_via = vec![SignOutMethod::Delete, SignOutMethod::Post];

        let registry = ScopeRegistry::from_config(&config).unwrap();
        let user = registry.get("user").unwrap();
        assert_eq!(user.sign_out_via(), &[Method::DELETE, Method::POST]);
    }
}
