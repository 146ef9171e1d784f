//! Axum extractors for the client session and request metadata.

use axum::{
    extract::FromRequestParts,
    http::{Method, header, request::Parts},
};
use std::sync::Arc;
use tracing::{instrument, trace};
use uuid::Uuid;

use crate::{
    AppState,
    config::Config,
    errors::{Error, Result},
    session::MemorySession,
};

/// Request metadata the authentication flows care about: the HTTP method, the
/// requested path (with query string), and whether the request is programmatic.
///
/// Programmatic (XHR-style) requests are detected via the
/// `X-Requested-With: XMLHttpRequest` header. They never leave pending
/// redirects behind.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub method: Method,
    pub path: String,
    pub programmatic: bool,
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let programmatic = parts
            .headers
            .get("x-requested-with")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));

        Ok(Self {
            method: parts.method.clone(),
            path,
            programmatic,
        })
    }
}

/// The calling client's session, loaded (or created) from the session cookie.
///
/// A request carrying a valid session cookie gets its existing session back;
/// anything else gets a fresh session. `is_new` tells handlers whether a
/// `Set-Cookie` header is needed on the response.
pub struct ClientSession {
    pub id: Uuid,
    pub session: Arc<MemorySession>,
    pub is_new: bool,
}

impl ClientSession {
    /// `Set-Cookie` header value for a newly created session, `None` when the
    /// client already holds the cookie.
    pub fn issue_cookie(&self, config: &Config) -> Option<String> {
        if !self.is_new {
            return None;
        }

        let session = &config.session;
        Some(format!(
            "{}={}; Path=/; HttpOnly; Secure={}; SameSite={}; Max-Age={}",
            session.cookie_name,
            self.id,
            session.cookie_secure,
            session.cookie_same_site,
            session.timeout.as_secs(),
        ))
    }
}

/// Find the session id in the Cookie header, if the client sent one.
fn session_id_from_cookies(parts: &Parts, cookie_name: &str) -> Option<Uuid> {
    let cookie_header = parts.headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                // Malformed ids are treated like a missing cookie
                return Uuid::parse_str(value).ok();
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for ClientSession {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(id) = session_id_from_cookies(parts, &state.config.session.cookie_name) {
            if let Some(session) = state.sessions.find(id) {
                trace!(session = %id, "resumed existing session");
                return Ok(Self {
                    id,
                    session,
                    is_new: false,
                });
            }
            // Stale cookie: the session is gone, start over
            trace!(session = %id, "session cookie references no live session");
        }

        let (id, session) = state.sessions.create();
        trace!(session = %id, "created new session");
        Ok(Self {
            id,
            session,
            is_new: true,
        })
    }
}
