//! Router creation and configuration
//!
//! Creates the Axum router for REST API endpoints.

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create REST API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/cds-services", get(discovery))
        .route("/cds-services/:id", post(execute_hook))
        .route("/v1/libraries", get(list_libraries))
        .route("/v1/libraries/:id", get(get_latest_library))
        .route("/v1/libraries/:id/:version", get(get_library))
        .route("/v1/repo/reload", post(reload_repository))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
