//! Application builder: wires router, middleware, and state into an Axum app.

use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use gatehouse_core::config::CorsConfig;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Largest accepted request body. Auth payloads are tiny.
const MAX_BODY_BYTES: usize = 16 * 1024;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}
