//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `GATEHOUSE_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `GATEHOUSE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `GATEHOUSE_SESSION__COOKIE_NAME=sid` sets the `session.cookie_name` field.
//!
//! ## Configuration Structure
//!
//! Key sections:
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Scopes**: `scopes.<name>` - One entry per authentication scope ("user", "admin", ...),
//!   each with its session key prefix, default destinations, sign-out methods, and an optional
//!   scoped-views override
//! - **Sign-out breadth**: `sign_out_all_scopes` - whether signing out of one scope cascades
//!   to every scope sharing the session
//! - **Views**: `scoped_views` (global default), `templates` (template ids known to the renderer)
//! - **Session cookie**: `session.*` - cookie carrying the opaque session id
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! GATEHOUSE_PORT=8080
//!
//! # Cascade sign-outs across scopes
//! GATEHOUSE_SIGN_OUT_ALL_SCOPES=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "GATEHOUSE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Sign-out breadth: `true` cascades a sign-out from any one scope to every
    /// registered scope; `false` isolates it to the triggering scope.
    ///
    /// Read at sign-out time through an explicit policy value, never cached per session.
    pub sign_out_all_scopes: bool,
    /// Global default for scope-specific template resolution. Individual scopes
    /// and handlers can override this.
    pub scoped_views: bool,
    /// Template identifiers known to the rendering engine. The view resolver
    /// only resolves to registered templates; scoped templates follow the
    /// `<scope>/<handler>/<view>` layout, defaults follow `<handler>/<view>`.
    pub templates: Vec<String>,
    /// Authentication scopes, keyed by scope name. Every scope a route refers
    /// to must appear here; a missing scope is a startup error.
    pub scopes: BTreeMap<String, ScopeSettings>,
    /// Principals known to the built-in directory resolver (demo/testing).
    pub principals: Vec<PrincipalSeed>,
    /// Session cookie configuration
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            sign_out_all_scopes: false,
            scoped_views: false,
            templates: Vec::new(),
            scopes: BTreeMap::from([("user".to_string(), ScopeSettings::default())]),
            principals: Vec::new(),
            session: SessionConfig::default(),
        }
    }
}

/// Per-scope configuration: where a scope's session entries live, where its
/// sign-in/sign-out flows land, and which HTTP methods may sign it out.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeSettings {
    /// Session key prefix for this scope's entries. Defaults to the scope name.
    /// Prefixes must be unique across scopes - they are the isolation boundary
    /// inside the shared session.
    pub key_prefix: Option<String>,
    /// Destination after a successful sign-in when no pending redirect exists
    pub after_sign_in_path: String,
    /// Destination after sign-out
    pub after_sign_out_path: String,
    /// HTTP methods accepted by this scope's sign-out endpoint (non-empty)
    pub sign_out_via: Vec<SignOutMethod>,
    /// Per-scope override of the global `scoped_views` default
    pub scoped_views: Option<bool>,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            key_prefix: None,
            after_sign_in_path: "/".to_string(),
            after_sign_out_path: "/".to_string(),
            sign_out_via: vec![SignOutMethod::Delete],
            scoped_views: None,
        }
    }
}

/// HTTP methods that may be configured for a scope's sign-out endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignOutMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl SignOutMethod {
    pub fn as_method(&self) -> axum::http::Method {
        match self {
            SignOutMethod::Get => axum::http::Method::GET,
            SignOutMethod::Post => axum::http::Method::POST,
            SignOutMethod::Put => axum::http::Method::PUT,
            SignOutMethod::Patch => axum::http::Method::PATCH,
            SignOutMethod::Delete => axum::http::Method::DELETE,
        }
    }
}

/// A principal seeded into the built-in directory resolver.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrincipalSeed {
    /// Principal type tag (e.g. "user", "admin")
    pub kind: String,
    /// Opaque identifier within the kind
    pub id: String,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for the opaque session id
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60 * 60 * 24),
            cookie_name: "gatehouse_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "strict".to_string(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("GATEHOUSE_").split("__"))
    }

    /// Validate the configuration for consistency and required fields.
    /// Scope misconfiguration is fatal here, at startup, never at request time.
    pub fn validate(&self) -> Result<(), Error> {
        if self.scopes.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: at least one authentication scope must be configured under `scopes`".to_string(),
            });
        }

        let mut seen_prefixes = std::collections::HashSet::new();
        for (name, scope) in &self.scopes {
            if name.is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: scope names cannot be empty".to_string(),
                });
            }

            if scope.sign_out_via.is_empty() {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: scope '{name}' has an empty sign_out_via set. \
                         Configure at least one HTTP method (e.g. [delete])."
                    ),
                });
            }

            for path in [&scope.after_sign_in_path, &scope.after_sign_out_path] {
                if !path.starts_with('/') {
                    return Err(Error::Internal {
                        operation: format!(
                            "Config validation: scope '{name}' default path '{path}' must be absolute (start with '/')"
                        ),
                    });
                }
            }

            let prefix = scope.key_prefix.clone().unwrap_or_else(|| name.clone());
            if prefix.is_empty() || prefix.contains(char::is_whitespace) {
                return Err(Error::Internal {
                    operation: format!("Config validation: scope '{name}' has an invalid session key prefix '{prefix}'"),
                });
            }
            if !seen_prefixes.insert(prefix.clone()) {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: session key prefix '{prefix}' is used by more than one scope. \
                         Prefixes are the isolation boundary and must be unique."
                    ),
                });
            }
        }

        match self.session.cookie_same_site.to_ascii_lowercase().as_str() {
            "strict" | "lax" | "none" => {}
            other => {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: session.cookie_same_site must be 'strict', 'lax', or 'none' (got '{other}')"
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_scopes_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
scopes:
  user:
    after_sign_in_path: /dashboard
    sign_out_via: [delete]
  admin:
    key_prefix: admin_area
    after_sign_in_path: /admin
    after_sign_out_path: /admin/goodbye
    sign_out_via: [delete, post]
    scoped_views: true
"#,
            )?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;

            assert_eq!(config.scopes.len(), 2);

            let user = &config.scopes["user"];
            assert_eq!(user.after_sign_in_path, "/dashboard");
            assert_eq!(user.after_sign_out_path, "/"); // default
            assert_eq!(user.sign_out_via, vec![SignOutMethod::Delete]);
            assert!(user.key_prefix.is_none());

            let admin = &config.scopes["admin"];
            assert_eq!(admin.key_prefix.as_deref(), Some("admin_area"));
            assert_eq!(admin.sign_out_via, vec![SignOutMethod::Delete, SignOutMethod::Post]);
            assert_eq!(admin.scoped_views, Some(true));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 0.0.0.0
port: 3000
"#,
            )?;

            jail.set_env("GATEHOUSE_HOST", "127.0.0.1");
            jail.set_env("GATEHOUSE_PORT", "8080");
            jail.set_env("GATEHOUSE_SIGN_OUT_ALL_SCOPES", "true");

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;

            // Env vars should override
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert!(config.sign_out_all_scopes);

            Ok(())
        });
    }

    #[test]
    fn test_nested_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 3000\n")?;
            jail.set_env("GATEHOUSE_SESSION__COOKIE_NAME", "sid");

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;
            assert_eq!(config.session.cookie_name, "sid");

            Ok(())
        });
    }

    #[test]
    fn test_empty_sign_out_via_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
scopes:
  user:
    sign_out_via: []
"#,
            )?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let result = Config::load(&args);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("sign_out_via"));

            Ok(())
        });
    }

    #[test]
    fn test_duplicate_key_prefix_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
scopes:
  user:
    key_prefix: shared
  admin:
    key_prefix: shared
"#,
            )?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let result = Config::load(&args);
            assert!(result.is_err());
            assert!(result.unwrap_err().to_string().contains("prefix"));

            Ok(())
        });
    }

    #[test]
    fn test_relative_default_path_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
scopes:
  user:
    after_sign_in_path: dashboard
"#,
            )?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            assert!(Config::load(&args).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_empty_scopes_rejected() {
        let config = Config {
            scopes: BTreeMap::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
