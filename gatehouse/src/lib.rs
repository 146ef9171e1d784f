//! Multi-scope authentication orchestration service.
//!
//! Gatehouse coordinates several independently authenticated principal
//! categories ("scopes" - users, admins, ...) over one shared session. Each
//! scope has its own session slot, its own sign-in/sign-out flows, and its own
//! defaults; signing into or out of one scope never leaks into another unless
//! the cascading sign-out policy is explicitly enabled.
//!
//! # Architecture
//!
//! - **[`scopes`]**: the scope registry - immutable per-scope configuration
//!   and the session key derivation contract
//! - **[`session`]**: the key-value session abstraction and the in-memory
//!   implementation used by the demo server and tests
//! - **[`auth`]**: the core flows - principal resolution, the authentication
//!   manager, pending-redirect tracking, and sign-out method gating
//! - **[`views`]**: scope-aware view-to-template resolution
//! - **[`api`]**: the HTTP surface - extractors, handlers, and models
//!
//! # Example
//!
//! ```ignore
//! let config = Config::default();
//! let app = Application::new(config)?;
//!
//! // Run with graceful shutdown on Ctrl+C
//! app.serve(async { tokio::signal::ctrl_c().await.unwrap() }).await?;
//! ```

use axum::{
    Extension, Router,
    routing::{any, get},
};
use bon::Builder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod scopes;
pub mod session;
pub mod telemetry;
pub mod views;

pub use config::Config;
pub use errors::{Error, Result};

use crate::{
    auth::{AuthenticationManager, DirectoryResolver, Principal, PrincipalRef, PrincipalResolver, SignOutBreadth},
    scopes::ScopeRegistry,
    session::{MemorySessions, SessionStore},
    views::{HandlerViewConfig, ViewResolver},
};

/// Shared application state for all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(Arc::new(config))
///     .registry(Arc::new(registry))
///     .sessions(Arc::new(MemorySessions::new()))
///     .resolver(resolver)
///     .views(Arc::new(views))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ScopeRegistry>,
    pub sessions: Arc<MemorySessions>,
    pub resolver: Arc<dyn PrincipalResolver>,
    pub views: Arc<ViewResolver>,
}

impl AppState {
    /// Assemble the per-request authentication manager for one client session.
    /// The sign-out breadth policy is read from config here, once per request.
    pub fn authentication<'a>(&'a self, session: &'a dyn SessionStore) -> AuthenticationManager<'a> {
        AuthenticationManager::new(
            self.registry.as_ref(),
            session,
            self.resolver.as_ref(),
            SignOutBreadth::from_config(&self.config),
        )
    }
}

/// Build the application router.
///
/// Every configured scope is served by the same endpoint family under its own
/// path segment; the scope name itself arrives as a path parameter and is
/// checked against the registry per request.
pub fn build_router(state: AppState) -> Router {
    let sign_in_views = HandlerViewConfig::builder().handler("sessions").build();

    let router = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/{scope}/sign_in",
            get(api::handlers::sessions::sign_in_form)
                .post(api::handlers::sessions::sign_in)
                .layer(Extension(sign_in_views)),
        )
        // Registered for every method; the handler gates on the scope's
        // configured sign_out_via set
        .route("/{scope}/sign_out", any(api::handlers::sessions::sign_out))
        .route("/{scope}/session", get(api::handlers::sessions::session_status))
        .route("/{scope}/account", get(api::handlers::account::show))
        .with_state(state);

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// The assembled application: state, router, and the serving loop.
pub struct Application {
    router: Router,
    config: Arc<Config>,
}

impl Application {
    /// Create a new application instance with all resources initialized.
    ///
    /// Fails when the scope configuration is invalid - a broken scope table
    /// must never make it to serving.
    pub fn new(config: Config) -> Result<Self> {
        debug!("Starting gatehouse with configuration: {:#?}", config);

        let registry = ScopeRegistry::from_config(&config)?;

        let directory = DirectoryResolver::new();
        for seed in &config.principals {
            let mut principal = Principal::new(PrincipalRef::new(seed.kind.clone(), seed.id.clone()));
            if let Some(name) = &seed.display_name {
                principal = principal.with_display_name(name.clone());
            }
            directory.insert(principal);
        }

        let views = ViewResolver::from_config(&config);

        let config = Arc::new(config);
        let state = AppState::builder()
            .config(config.clone())
            .registry(Arc::new(registry))
            .sessions(Arc::new(MemorySessions::new()))
            .resolver(Arc::new(directory))
            .views(Arc::new(views))
            .build();

        let router = build_router(state);

        Ok(Self { router, config })
    }

    /// The assembled router, for embedding or driving a test server.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Gatehouse listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
