//! Scope-aware view resolution.
//!
//! Given a scope and a logical view name, the resolver picks the concrete
//! template identifier to render. Template ids follow a directory-style
//! layout: `<handler>/<view>` for shared defaults and
//! `<scope>/<handler>/<view>` for scope-specific overrides.
//!
//! Whether scope-specific templates are attempted is a three-level flag,
//! most specific wins: per-handler override > per-scope override > global
//! default. Handler overrides are immutable records attached at registration
//! time, so a handler's setting can never leak to other handlers sharing the
//! same scope, or between requests.
//!
//! Enabling scoped views is an opt-in contract that a matching template
//! exists: a missing scope-specific template fails with a distinct
//! [`Error::ViewNotFound`] instead of silently falling back to the default.

use bon::Builder;
use std::collections::HashSet;
use tracing::trace;

use crate::{
    config::Config,
    errors::{Error, Result},
    scopes::ScopeConfig,
};

/// Immutable per-handler view configuration, attached at route registration.
#[derive(Debug, Clone, Builder)]
pub struct HandlerViewConfig {
    /// Handler name, used as the template directory (e.g. "sessions")
    #[builder(into)]
    pub handler: String,
    /// Per-handler override of the scope/global scoped-views setting
    pub scoped_views: Option<bool>,
}

/// Resolves `(scope, logical view)` pairs to concrete template identifiers.
#[derive(Debug, Clone)]
pub struct ViewResolver {
    /// Template ids known to the rendering engine
    templates: HashSet<String>,
    /// Global default for scope-specific template resolution
    scoped_views_default: bool,
}

impl ViewResolver {
    pub fn new(scoped_views_default: bool) -> Self {
        Self {
            templates: HashSet::new(),
            scoped_views_default,
        }
    }

    /// Build a resolver seeded with the globally configured template set.
    pub fn from_config(config: &Config) -> Self {
        let mut resolver = Self::new(config.scoped_views);
        for template in &config.templates {
            resolver.register(template.clone());
        }
        resolver
    }

    /// Register a template id the rendering engine can serve.
    pub fn register(&mut self, template: impl Into<String>) {
        self.templates.insert(template.into());
    }

    pub fn is_registered(&self, template: &str) -> bool {
        self.templates.contains(template)
    }

    /// Effective scoped-views flag for a `(scope, handler)` pair.
    /// Most specific wins: handler override > scope override > global default.
    fn scoped_views_enabled(&self, scope: &ScopeConfig, handler: &HandlerViewConfig) -> bool {
        handler
            .scoped_views
            .or(scope.scoped_views())
            .unwrap_or(self.scoped_views_default)
    }

    /// Resolve the template to render for `view` in `scope`.
    ///
    /// With scoped views effectively enabled, only the scope-specific template
    /// `<scope>/<handler>/<view>` is acceptable; its absence is a
    /// [`Error::ViewNotFound`]. With scoped views disabled, the shared
    /// `<handler>/<view>` id is returned.
    pub fn resolve(&self, scope: &ScopeConfig, handler: &HandlerViewConfig, view: &str) -> Result<String> {
        let default_id = format!("{}/{}", handler.handler, view);

        if self.scoped_views_enabled(scope, handler) {
            let scoped_id = format!("{}/{}", scope.name(), default_id);
            if self.templates.contains(&scoped_id) {
                trace!(scope = scope.name(), view, template = %scoped_id, "resolved scoped template");
                return Ok(scoped_id);
            }
            // Opt-in contract: no silent fallback to the shared template
            return Err(Error::ViewNotFound {
                scope: scope.name().to_string(),
                view: default_id,
            });
        }

        trace!(scope = scope.name(), view, template = %default_id, "resolved default template");
        Ok(default_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ScopeSettings};
    use crate::scopes::ScopeRegistry;
    use std::collections::BTreeMap;

    fn registry(user_scoped_views: Option<bool>, admin_scoped_views: Option<bool>) -> ScopeRegistry {
        let config = Config {
            scopes: BTreeMap::from([
                (
                    "user".to_string(),
                    ScopeSettings {
                        scoped_views: user_scoped_views,
                        ..Default::default()
                    },
                ),
                (
                    "admin".to_string(),
                    ScopeSettings {
                        scoped_views: admin_scoped_views,
                        ..Default::default()
                    },
                ),
            ]),
            ..Default::default()
        };
        ScopeRegistry::from_config(&config).unwrap()
    }

    fn sessions_handler() -> HandlerViewConfig {
        HandlerViewConfig::builder().handler("sessions").build()
    }

    #[test]
    fn test_scoped_template_wins_when_enabled() {
        let registry = registry(Some(true), None);
        let mut resolver = ViewResolver::new(false);
        resolver.register("sessions/new");
        resolver.register("user/sessions/new");

        let scope = registry.get("user").unwrap();
        let template = resolver.resolve(scope, &sessions_handler(), "new").unwrap();
        assert_eq!(template, "user/sessions/new");
    }

    #[test]
    fn test_disabled_scope_gets_shared_default() {
        let registry = registry(Some(true), None);
        let mut resolver = ViewResolver::new(false);
        resolver.register("sessions/new");
        resolver.register("user/sessions/new");

        // Admin has no override and the global default is off
        let scope = registry.get("admin").unwrap();
        let template = resolver.resolve(scope, &sessions_handler(), "new").unwrap();
        assert_eq!(template, "sessions/new");
    }

    #[test]
    fn test_enabled_but_missing_scoped_template_is_a_distinct_failure() {
        let registry = registry(Some(true), None);
        let mut resolver = ViewResolver::new(false);
        resolver.register("sessions/new");

        let scope = registry.get("user").unwrap();
        let err = resolver.resolve(scope, &sessions_handler(), "new").unwrap_err();
        assert!(matches!(err, Error::ViewNotFound { scope, view } if scope == "user" && view == "sessions/new"));
    }

    #[test]
    fn test_handler_override_beats_scope_and_global() {
        let registry = registry(Some(true), None);
        let mut resolver = ViewResolver::new(true);
        resolver.register("sessions/new");
        resolver.register("user/sessions/new");

        // Handler explicitly opts out despite scope and global both enabling
        let handler = HandlerViewConfig::builder().handler("sessions").scoped_views(false).build();

        let scope = registry.get("user").unwrap();
        let template = resolver.resolve(scope, &handler, "new").unwrap();
        assert_eq!(template, "sessions/new");
    }

    #[test]
    fn test_handler_override_does_not_leak_to_other_handlers() {
        let registry = registry(None, None);
        let mut resolver = ViewResolver::new(false);
        resolver.register("sessions/new");
        resolver.register("user/sessions/new");
        resolver.register("registrations/new");

        let opted_in = HandlerViewConfig::builder().handler("sessions").scoped_views(true).build();
        let plain = HandlerViewConfig::builder().handler("registrations").build();

        let scope = registry.get("user").unwrap();

        assert_eq!(resolver.resolve(scope, &opted_in, "new").unwrap(), "user/sessions/new");
        // The sibling handler on the same scope still follows the global default
        assert_eq!(resolver.resolve(scope, &plain, "new").unwrap(), "registrations/new");
    }

    #[test]
    fn test_global_default_enables_all_scopes() {
        let registry = registry(None, None);
        let mut resolver = ViewResolver::new(true);
        resolver.register("user/sessions/new");

        let scope = registry.get("user").unwrap();
        assert_eq!(
            resolver.resolve(scope, &sessions_handler(), "new").unwrap(),
            "user/sessions/new"
        );

        // Admin is covered by the same global default, and has no template
        let scope = registry.get("admin").unwrap();
        assert!(matches!(
            resolver.resolve(scope, &sessions_handler(), "new").unwrap_err(),
            Error::ViewNotFound { .. }
        ));
    }

    #[test]
    fn test_from_config_registers_templates() {
        let config = Config {
            templates: vec!["sessions/new".to_string(), "user/sessions/new".to_string()],
            scoped_views: false,
            ..Default::default()
        };
        let resolver = ViewResolver::from_config(&config);
        assert!(resolver.is_registered("sessions/new"));
        assert!(resolver.is_registered("user/sessions/new"));
        assert!(!resolver.is_registered("admin/sessions/new"));
    }
}
