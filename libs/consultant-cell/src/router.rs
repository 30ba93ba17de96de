use std::sync::Arc;

use axum::{Router, routing::get};

use shared_config::AppConfig;

use crate::handlers;

/// Consultant browsing is public; slot and roster management lives in slot-cell.
pub fn consultant_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_consultants))
        .route("/{consultant_id}", get(handlers::get_consultant))
        .route("/{consultant_id}/slots", get(handlers::get_consultant_slots))
        .with_state(state)
}
