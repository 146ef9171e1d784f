//! Sign-in, sign-out, and session status endpoints.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::{
        extract::{ClientSession, RequestMeta},
        handlers::scope_or_not_found,
        models::sessions::{
            SessionStatus, SessionStatusResponse, SignInBody, SignInRequest, SignInResponse, SignOutBody, ViewResponse,
        },
    },
    auth::{RedirectTracker, SignOutGate},
    errors::{Error, Result},
    views::HandlerViewConfig,
};

/// Report the template for the scope's sign-in view.
#[tracing::instrument(skip_all, fields(scope = %scope))]
pub async fn sign_in_form(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    Extension(view_config): Extension<HandlerViewConfig>,
) -> Result<Json<ViewResponse>> {
    let scope_config = scope_or_not_found(&state, &scope)?;
    let template = state.views.resolve(scope_config, &view_config, "new")?;

    Ok(Json(ViewResponse { scope, template }))
}

/// Sign a principal into the scope.
///
/// The principal reference must resolve against the directory; an unknown
/// reference is rejected before any session state changes. On success the
/// scope's pending redirect (if any) is redeemed into `redirect_to`.
#[tracing::instrument(skip_all, fields(scope = %scope))]
pub async fn sign_in(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    client: ClientSession,
    Json(request): Json<SignInRequest>,
) -> Result<SignInResponse> {
    scope_or_not_found(&state, &scope)?;

    let reference = request.reference();
    let Some(principal) = state.resolver.resolve(&reference)? else {
        return Err(Error::BadRequest {
            message: format!("Unknown principal '{reference}'"),
        });
    };

    let manager = state.authentication(client.session.as_ref());
    let redirect_to = manager.authenticate(&scope, &reference)?;

    Ok(SignInResponse {
        body: SignInBody {
            scope,
            principal,
            redirect_to,
        },
        cookie: client.issue_cookie(&state.config),
    })
}

/// Sign out of the scope.
///
/// The HTTP method is checked against the scope's configured set first; a
/// disallowed method falls through as an unmatched route and leaves every
/// scope's authentication state untouched.
#[tracing::instrument(skip_all, fields(scope = %scope, method = %meta.method))]
pub async fn sign_out(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    meta: RequestMeta,
    client: ClientSession,
) -> Result<Json<SignOutBody>> {
    let scope_config = scope_or_not_found(&state, &scope)?;

    if !SignOutGate::is_allowed(scope_config, &meta.method) {
        return Err(Error::NotFound {
            resource: format!("Route {} {}", meta.method, meta.path),
        });
    }

    let manager = state.authentication(client.session.as_ref());
    let redirect_to = manager.deauthenticate(&scope)?;

    Ok(Json(SignOutBody { scope, redirect_to }))
}

/// Report the scope's session status: authentication state, the resolved
/// principal, and any pending post-sign-in destination. Also the cheapest way
/// for a client to establish a session cookie.
#[tracing::instrument(skip_all, fields(scope = %scope))]
pub async fn session_status(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    client: ClientSession,
) -> Result<SessionStatusResponse> {
    let scope_config = scope_or_not_found(&state, &scope)?.clone();

    let manager = state.authentication(client.session.as_ref());
    let principal = manager.current_principal(&scope)?;

    let pending_redirect = RedirectTracker::new(&scope_config, client.session.as_ref()).peek()?;

    Ok(SessionStatusResponse {
        status: SessionStatus {
            scope,
            authenticated: principal.is_some(),
            principal,
            pending_redirect,
        },
        cookie: client.issue_cookie(&state.config),
    })
}
