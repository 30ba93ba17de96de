use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::staff_writes_middleware;

use crate::handlers;

/// Anyone reads published posts; staff also see drafts and manage posts.
pub fn blog_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_blogs).post(handlers::create_blog))
        .route(
            "/{blog_id}",
            get(handlers::get_blog)
                .put(handlers::update_blog)
                .delete(handlers::delete_blog),
        )
        .layer(middleware::from_fn_with_state(state.clone(), staff_writes_middleware))
        .with_state(state)
}

pub fn gallery_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_gallery).post(handlers::create_gallery_image))
        .route(
            "/{image_id}",
            put(handlers::update_gallery_image).delete(handlers::delete_gallery_image),
        )
        .layer(middleware::from_fn_with_state(state.clone(), staff_writes_middleware))
        .with_state(state)
}
