//! Router assembly for the cache service.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, keys_handler, set_handler,
    stats_handler, AppState,
};

/// Builds the service router over `state`.
///
/// Cache operations:
/// - `PUT /set`, `GET /get/:key`, `DELETE /del/:key`
/// - `DELETE /clear`, `GET /keys?prefix=`
///
/// Service endpoints: `GET /stats`, `GET /health`.
///
/// Every route allows any origin and is traced through `tower_http`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(cache_routes())
        .merge(service_routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cache_routes() -> Router<AppState> {
    Router::new()
        .route("/set", put(set_handler))
        .route("/get/:key", get(get_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/clear", delete(clear_handler))
        .route("/keys", get(keys_handler))
}

fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
