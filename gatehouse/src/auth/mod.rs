//! Authenticated-session lifecycle and scope semantics.
//!
//! This module is the heart of the crate: concurrently tracking multiple
//! authenticated identities per client session with strict scope isolation.
//!
//! - [`principal`]: tagged principal references and the resolution trait
//! - [`manager`]: per-scope authenticate / deauthenticate with the sign-out
//!   breadth policy
//! - [`redirect`]: single-use "resume here after sign-in" destinations
//! - [`gate`]: HTTP-method gating for sign-out endpoints
//!
//! All state lives in the client's [`SessionStore`](crate::session::SessionStore)
//! under scope-prefixed keys; nothing here performs network calls.

pub mod gate;
pub mod manager;
pub mod principal;
pub mod redirect;

pub use gate::SignOutGate;
pub use manager::{AuthenticationManager, SignOutBreadth};
pub use principal::{DirectoryResolver, Principal, PrincipalRef, PrincipalResolver};
pub use redirect::RedirectTracker;
