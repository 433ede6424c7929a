use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{addon, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Operational API
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::get_status))
        .route("/config", get(handlers::get_config))
        .route("/refresh", post(handlers::trigger_refresh))
        .with_state(Arc::clone(&state));

    // Addon protocol. Path segments carry a ".json" suffix that the
    // handlers strip themselves.
    let addon_routes = Router::new()
        .route("/manifest.json", get(addon::manifest))
        .route("/catalog/movie/{catalog_file}", get(addon::catalog))
        .route(
            "/catalog/movie/{catalog_id}/{extra_file}",
            get(addon::catalog_with_extra),
        )
        .route("/meta/movie/{meta_file}", get(addon::meta))
        .with_state(state);

    Router::new()
        .merge(addon_routes)
        .nest("/api/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
