//! Example scope-protected resource.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::{
        extract::{ClientSession, RequestMeta},
        handlers::scope_or_not_found,
        models::sessions::ProtectedResource,
    },
    errors::{Error, Result},
};

/// A resource gated on the scope's authentication.
///
/// Denied browser requests leave a pending redirect behind so the client can
/// resume here after signing in; the 401 still carries the session cookie when
/// the session was just created, otherwise the recorded destination would be
/// orphaned. Programmatic requests get a plain 401 with no session side
/// effects.
#[tracing::instrument(skip_all, fields(scope = %scope))]
pub async fn show(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    meta: RequestMeta,
    client: ClientSession,
) -> Result<Response> {
    scope_or_not_found(&state, &scope)?;

    let manager = state.authentication(client.session.as_ref());

    match manager.require_authenticated(&scope, &meta.path, meta.programmatic) {
        Ok(principal) => {
            let mut response = Json(ProtectedResource { scope, principal }).into_response();
            attach_cookie(&mut response, &client, &state);
            Ok(response)
        }
        Err(err @ Error::Unauthenticated { .. }) => {
            let mut response = err.into_response();
            attach_cookie(&mut response, &client, &state);
            Ok(response)
        }
        Err(err) => Err(err),
    }
}

fn attach_cookie(response: &mut Response, client: &ClientSession, state: &AppState) {
    if let Some(cookie) = client.issue_cookie(&state.config) {
        if let Ok(value) = cookie.parse() {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
}
