use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/diag", get(handlers::diag))
        // Settings
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::put_settings),
        )
        // Lists
        .route(
            "/lists/:collection",
            get(handlers::get_list).post(handlers::add_to_list),
        )
        .route("/cache/pool", get(handlers::cache_pool))
        // Recommendation
        .route("/l1", get(handlers::recommend))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}
