use std::sync::Arc;

use axum::{Router, routing::post};

use shared_config::AppConfig;

use crate::handlers;

/// Checkout callbacks arrive from the patient's browser, so these stay public.
pub fn payment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{appointment_id}/initiate", post(handlers::initiate_payment))
        .route("/{appointment_id}/verify", post(handlers::verify_payment))
        .with_state(state)
}
