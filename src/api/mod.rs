// API layer: handlers and router assembly
use crate::handlers::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod handlers {
    pub use crate::handlers::*;
}

/// Address queries are short strings; anything bigger is rejected before parsing.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Routes that take user input. The binary adds rate limiting on top.
pub fn query_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/query",
            post(handlers::query_address).fallback(handlers::method_not_allowed),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Full application: health check plus the given query routes, with tracing and CORS.
pub fn build_router(state: Arc<AppState>, query_routes: Router<Arc<AppState>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(query_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Router without rate limiting, as used by tests.
pub fn app(state: Arc<AppState>) -> Router {
    build_router(state, query_routes())
}
