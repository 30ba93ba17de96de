use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::staff_middleware;

use crate::handlers;

pub fn slot_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/available", get(handlers::get_available_slots));

    let staff_routes = Router::new()
        .route("/", get(handlers::list_slots).post(handlers::create_slot))
        .route("/range", post(handlers::create_slot_range))
        .route("/range/preview", post(handlers::preview_slot_range))
        .route(
            "/{slot_id}",
            get(handlers::get_slot)
                .put(handlers::update_slot)
                .delete(handlers::delete_slot),
        )
        .layer(middleware::from_fn_with_state(state.clone(), staff_middleware));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .with_state(state)
}
