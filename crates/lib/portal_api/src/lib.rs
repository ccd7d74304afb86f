//! # portal_api
//!
//! HTTP API library for the Omniflow client portal.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{health, invites, users};
use portal_core::identity::IdentityProvider;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Identity-provider client.
    pub identity: Arc<dyn IdentityProvider>,
}

/// Run embedded database migrations.
///
/// Delegates to `portal_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    portal_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new().route("/api/health", get(health::health_handler));

    // Protected routes (require a provider-backed session)
    let protected = Router::new()
        .route(
            "/api/invites",
            post(invites::create_invite_handler).get(invites::list_invites_handler),
        )
        .route("/api/invites/{id}", delete(invites::cancel_invite_handler))
        .route("/api/invites/mark-used", post(invites::mark_used_handler))
        .route("/api/users", get(users::list_users_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
