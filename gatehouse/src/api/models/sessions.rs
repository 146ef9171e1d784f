//! Models for the per-scope session endpoints.

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::auth::{Principal, PrincipalRef};

/// Request to sign a principal into a scope.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignInRequest {
    /// Principal type tag (e.g. "user")
    pub kind: String,
    /// Opaque identifier within the kind
    pub id: String,
}

impl SignInRequest {
    pub fn reference(&self) -> PrincipalRef {
        PrincipalRef::new(self.kind.clone(), self.id.clone())
    }
}

/// Body of a successful sign-in.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignInBody {
    /// The scope the principal signed into
    pub scope: String,
    /// The resolved principal
    pub principal: Principal,
    /// Where the client should navigate next (redeemed pending redirect, or
    /// the scope's default)
    pub redirect_to: String,
}

/// Structured response for successful sign-in, carrying the session cookie
/// when a new session was created for the client.
pub struct SignInResponse {
    pub body: SignInBody,
    pub cookie: Option<String>,
}

impl IntoResponse for SignInResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = self.cookie {
            if let Ok(value) = cookie.parse() {
                headers.insert(header::SET_COOKIE, value);
            }
        }
        (StatusCode::OK, headers, Json(self.body)).into_response()
    }
}

/// Body of a successful sign-out.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignOutBody {
    /// The scope that was signed out
    pub scope: String,
    /// Where the client should navigate next
    pub redirect_to: String,
}

/// Per-scope session status.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub scope: String,
    pub authenticated: bool,
    /// The resolved principal, when authenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// The pending post-sign-in destination, if one is recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_redirect: Option<String>,
}

/// Structured response for the session status endpoint, carrying the session
/// cookie when a new session was created for the client.
pub struct SessionStatusResponse {
    pub status: SessionStatus,
    pub cookie: Option<String>,
}

impl IntoResponse for SessionStatusResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = self.cookie {
            if let Ok(value) = cookie.parse() {
                headers.insert(header::SET_COOKIE, value);
            }
        }
        (StatusCode::OK, headers, Json(self.status)).into_response()
    }
}

/// Response for view-rendering endpoints: the concrete template id the
/// renderer should use for the scope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewResponse {
    pub scope: String,
    pub template: String,
}

/// Body of a scope-protected resource, echoing the authenticated principal.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProtectedResource {
    pub scope: String,
    pub principal: Principal,
}
