//! Principal references and resolution.
//!
//! A principal is represented in session storage as a tagged reference
//! `{kind, id}` rather than a live object. Resolution back to a live
//! principal is an explicit, fallible step: the underlying record may have
//! been deleted mid-session, or the kind may no longer be known. Both cases
//! resolve to `None` and are treated by the manager as a first-class
//! transition to Unauthenticated, never as a request-failing error.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Opaque identifier plus type tag, as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    /// Principal type tag (e.g. "user", "admin")
    pub kind: String,
    /// Opaque identifier within the kind
    pub id: String,
}

impl PrincipalRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A resolved, live principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The reference this principal was resolved from
    pub reference: PrincipalRef,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(reference: PrincipalRef) -> Self {
        Self {
            reference,
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Resolves stored principal references back to live principals.
///
/// Returning `Ok(None)` means the reference no longer resolves (record gone,
/// kind unknown) and the caller must treat it as unauthenticated. `Err` is
/// reserved for backend failures (e.g. the account store being unreachable).
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, reference: &PrincipalRef) -> Result<Option<Principal>>;
}

/// In-memory principal directory, used by the demo server and tests.
#[derive(Debug, Default)]
pub struct DirectoryResolver {
    entries: DashMap<PrincipalRef, Principal>,
}

impl DirectoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) {
        self.entries.insert(principal.reference.clone(), principal);
    }

    /// Remove a principal, simulating the underlying record being deleted
    /// while a session still references it.
    pub fn remove(&self, reference: &PrincipalRef) {
        self.entries.remove(reference);
    }
}

impl PrincipalResolver for DirectoryResolver {
    fn resolve(&self, reference: &PrincipalRef) -> Result<Option<Principal>> {
        Ok(self.entries.get(reference).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_resolution() {
        let directory = DirectoryResolver::new();
        let reference = PrincipalRef::new("user", "42");
        directory.insert(Principal::new(reference.clone()).with_display_name("Alice"));

        let resolved = directory.resolve(&reference).unwrap().unwrap();
        assert_eq!(resolved.reference, reference);
        assert_eq!(resolved.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_removed_principal_no_longer_resolves() {
        let directory = DirectoryResolver::new();
        let reference = PrincipalRef::new("user", "42");
        directory.insert(Principal::new(reference.clone()));
        directory.remove(&reference);

        assert!(directory.resolve(&reference).unwrap().is_none());
    }

    #[test]
    fn test_unknown_kind_resolves_to_none() {
        let directory = DirectoryResolver::new();
        directory.insert(Principal::new(PrincipalRef::new("user", "42")));

        // Same id, different kind: must not resolve
        assert!(directory.resolve(&PrincipalRef::new("admin", "42")).unwrap().is_none());
    }

    #[test]
    fn test_reference_serde_roundtrip() {
        let reference = PrincipalRef::new("admin", "7");
        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "admin", "id": "7"}));
        let back: PrincipalRef = serde_json::from_value(value).unwrap();
        assert_eq!(back, reference);
    }
}
