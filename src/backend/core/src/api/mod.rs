//! HTTP surface: router assembly and the per-route webservice guard.

pub mod guard;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::access::chain::PermissionChain;
use crate::auth::service::AuthService;
use crate::auth::token::TokenService;
use crate::registry::entity::EntityRegistry;

pub use guard::RequireWebserviceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<PermissionChain>,
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
    pub entities: Arc<EntityRegistry>,
    pub pool: PgPool,
}

/// Build the application router. Every route is registered under its
/// webservice id; the guard layer evaluates the chain before the handler
/// runs.
pub fn build_router(state: AppState) -> Router {
    let chain = state.chain.clone();
    let tokens = state.tokens.clone();
    let guard = move |webservice: &str| {
        RequireWebserviceLayer::new(chain.clone(), tokens.clone(), webservice)
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/login", post(handlers::login).layer(guard("login")))
        .route("/me", get(handlers::me).layer(guard("me")))
        .route("/users", get(handlers::list_users).layer(guard("user_list")))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
