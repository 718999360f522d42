//! # blogd: blog backend
//!
//! `blogd` serves a small blog API: people register and log in, then create and edit posts. Only a
//! post's author may change or delete it.
//!
//! ## Authentication
//!
//! Sessions are stateless. A successful register or login returns a signed token (HS256 JWT)
//! inside an `HttpOnly` cookie; every later request carries it back. The token holds the caller's
//! user id, email and name, so checking a request costs one signature check and no store lookup.
//! Passwords are stored as Argon2id hashes. Logout clears the cookie in the browser; the token
//! itself stays valid until it expires.
//!
//! Handlers say what they need in their signature:
//!
//! - [`auth::current_user::MaybeIdentity`] resolves the caller if it can and never rejects
//! - [`api::models::users::Identity`] is the guard: a request without a valid session gets a 401
//!
//! ## Authorization
//!
//! Post update and delete go through [`auth::ownership::authorize_existing`]: a missing post is
//! a 404 for everyone, an existing one is a 403 for anyone but its author.
//!
//! ## Storage
//!
//! Handlers reach users and posts through a [`db::Store`]. [`db::PgStore`] uses PostgreSQL
//! (migrations are applied at startup); [`db::MemoryStore`] keeps everything in process and is
//! the default when no database is configured.
//!
//! ## Errors
//!
//! Every failure is an [`errors::Error`]. Validation failures render as a JSON object mapping
//! field names to messages; everything else renders as `{statusCode, message, error}`.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
#[cfg(test)]
mod test;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::HeaderValue,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::{
    api::handlers::{auth as auth_handlers, health, posts},
    auth::service::AuthenticationService,
    config::{CorsOrigin, DatabaseConfig},
    db::{MemoryStore, PgStore, Store},
    openapi::ApiDoc,
};

/// Shared state for all request handlers.
///
/// Cloned into every request; everything inside is either cheap to clone or behind an [`Arc`].
#[derive(Clone)]
pub struct AppState<S> {
    pub config: Arc<Config>,
    pub store: S,
    pub auth: Arc<AuthenticationService<S>>,
}

impl<S: Store> AppState<S> {
    pub fn new(config: Config, store: S) -> errors::Result<Self> {
        let auth = AuthenticationService::from_config(store.clone(), &config)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            auth: Arc::new(auth),
        })
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.security.cors.allow_credentials);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the full HTTP router over `state`.
pub fn build_router<S: Store>(state: AppState<S>) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let api_routes = Router::new()
        .route("/auth/register", post(auth_handlers::register::<S>))
        .route("/auth/login", post(auth_handlers::login::<S>))
        .route("/auth/logout", post(auth_handlers::logout::<S>))
        .route("/posts", get(posts::list_posts::<S>).post(posts::create_post::<S>))
        .route("/posts/me", get(posts::list_my_posts::<S>))
        .route(
            "/posts/{id}",
            get(posts::get_post::<S>)
                .put(posts::update_post::<S>)
                .delete(posts::delete_post::<S>),
        )
        .with_state(state);

    let router = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .merge(api_routes)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// A configured server, ready to bind.
///
/// 1. **Create**: [`Application::new`] opens the store (connecting and migrating PostgreSQL if
///    configured) and builds the router
/// 2. **Serve**: [`Application::serve`] binds to the configured address and handles requests
///    until the shutdown future resolves, then closes database connections
pub struct Application {
    router: Router,
    config: Config,
    pg_store: Option<PgStore>,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        info!(environment = ?config.environment, "Starting blogd");

        let (router, pg_store) = match &config.database {
            DatabaseConfig::Memory => {
                warn!("Using the in-memory store; all data is lost on restart");
                let state = AppState::new(config.clone(), MemoryStore::new())?;
                (build_router(state)?, None)
            }
            DatabaseConfig::External { url, pool } => {
                let store = PgStore::connect(url, pool).await?;
                let state = AppState::new(config.clone(), store.clone())?;
                (build_router(state)?, Some(store))
            }
        };

        Ok(Self { router, config, pg_store })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("blogd listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(store) = self.pg_store {
            store.close().await;
        }

        Ok(())
    }
}
