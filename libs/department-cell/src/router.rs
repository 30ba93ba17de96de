use std::sync::Arc;

use axum::{Router, routing::get};

use shared_config::AppConfig;

use crate::handlers;

pub fn department_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_departments))
        .route("/{department_id}", get(handlers::get_department))
        .route("/{department_id}/services", get(handlers::get_department_services))
        .route("/{department_id}/consultants", get(handlers::get_department_consultants))
        .with_state(state)
}
