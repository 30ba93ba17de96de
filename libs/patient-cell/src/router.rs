use std::sync::Arc;
use axum::{middleware, routing::get, Router};
use shared_config::AppConfig;
use shared_utils::extractor::staff_middleware;

use crate::handlers::*;

pub fn patient_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/search", get(search_patients))
        .route("/{mr_no}", get(get_patient))
        .layer(middleware::from_fn_with_state(config.clone(), staff_middleware))
        .with_state(config)
}
