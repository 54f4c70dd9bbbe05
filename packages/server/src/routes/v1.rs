use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Multipart overhead allowed on top of the file bytes themselves.
const FORM_OVERHEAD: usize = 1024 * 1024;

/// Upload batches accept at most this many files' worth of bytes.
const MAX_BATCH_FILES: usize = 10;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    let max_file = usize::try_from(config.storage.max_file_size).unwrap_or(usize::MAX);
    // A data URI inflates its payload by a third.
    let single = DefaultBodyLimit::max(max_file.saturating_mul(2).saturating_add(FORM_OVERHEAD));
    let batch = DefaultBodyLimit::max(
        max_file
            .saturating_mul(2 * MAX_BATCH_FILES)
            .saturating_add(FORM_OVERHEAD),
    );

    Router::new()
        .nest("/lecturers", lecturer_routes().layer(single.clone()))
        .nest("/posts", post_routes().layer(single))
        .nest("/keywords", keyword_routes())
        .nest("/categories", category_routes())
        .nest("/uploads", upload_routes().layer(batch))
}

fn lecturer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::lecturer::list_lecturers).post(handlers::lecturer::create_lecturer),
        )
        .route("/search", get(handlers::lecturer::search_lecturers))
        .route(
            "/{id}",
            get(handlers::lecturer::get_lecturer)
                .patch(handlers::lecturer::update_lecturer)
                .delete(handlers::lecturer::delete_lecturer),
        )
        .route(
            "/{id}/keywords",
            post(handlers::lecturer::add_keywords).delete(handlers::lecturer::remove_keywords),
        )
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::post::list_posts).post(handlers::post::create_post),
        )
        .route(
            "/{id}",
            get(handlers::post::get_post)
                .patch(handlers::post::update_post)
                .delete(handlers::post::delete_post),
        )
}

fn keyword_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::keyword::list_keywords).post(handlers::keyword::create_keyword),
    )
}

fn category_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::category::list_categories).post(handlers::category::create_category),
    )
}

fn upload_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::upload::upload_files).delete(handlers::upload::delete_media),
        )
        .route("/base64", post(handlers::upload::upload_base64))
}
