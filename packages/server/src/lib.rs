pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod relations;
pub mod routes;
pub mod services;
pub mod state;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
///
/// The JSON API lives under `/api/v1`; stored media is served read-only from
/// `/<public_prefix>/...`, matching the paths persisted on entities.
pub fn build_router(state: AppState) -> axum::Router {
    let media_mount = format!("/{}", state.config.storage.public_prefix);

    axum::Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .nest_service(&media_mount, ServeDir::new(&state.media_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

