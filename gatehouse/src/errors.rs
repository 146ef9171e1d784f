use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required for a scope but not provided (or no longer valid)
    #[error("Not authenticated")]
    Unauthenticated { scope: Option<String> },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found. Also covers the sign-out fall-through
    /// case: a sign-out request whose method is outside the scope's configured
    /// set is surfaced as an unmatched route, never as a state change.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Scoped views are enabled for the scope but no matching scope-specific
    /// template is registered. Distinct from the disabled case so callers can
    /// render a not-found response instead of silently falling back.
    #[error("No scoped template for view {view} in scope {scope}")]
    ViewNotFound { scope: String, view: String },

    /// A route referenced a scope that is not in the registry. Startup
    /// validation makes this unreachable in a correctly configured app.
    #[error("Scope {scope} is not configured")]
    UnknownScope { scope: String },

    /// Session store failure, passed through to the caller unmodified
    #[error(transparent)]
    Session(anyhow::Error),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap an underlying session-store failure. The core performs no retries;
    /// storage reliability is the store's responsibility.
    pub fn session(err: impl Into<anyhow::Error>) -> Self {
        Error::Session(err.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::ViewNotFound { .. } => StatusCode::NOT_FOUND,
            Error::UnknownScope { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { scope } => match scope {
                Some(scope) => format!("Authentication required for scope '{scope}'"),
                None => "Authentication required".to_string(),
            },
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::ViewNotFound { scope, view } => {
                format!("No template found for view '{view}' in scope '{scope}'")
            }
            Error::UnknownScope { .. } => "Internal server error".to_string(),
            Error::Session(_) => "Internal server error".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::UnknownScope { .. } | Error::Session(_) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authentication error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::ViewNotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let user_message = self.user_message();
        (status, user_message).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
