use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::staff_middleware;

use crate::handlers;

/// Appointment management is staff only; patients book through the wizard.
pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    let staff_routes = Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::create_appointment))
        .route("/stats", get(handlers::get_appointment_stats))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/refund", post(handlers::refund_appointment))
        .route("/{appointment_id}/schedule", post(handlers::schedule_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), staff_middleware));

    Router::new()
        .merge(staff_routes)
        .with_state(state)
}
