use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::WizardState;

/// Public booking flow; the session id is the only credential a patient holds.
pub fn booking_wizard_routes(state: WizardState) -> Router {
    Router::new()
        .route("/", post(handlers::start_session))
        .route("/{session_id}", get(handlers::get_session).delete(handlers::cancel_session))
        .route("/{session_id}/actions", post(handlers::apply_action))
        .route("/{session_id}/back", post(handlers::go_back))
        .route("/{session_id}/options", get(handlers::get_step_options))
        .with_state(state)
}
