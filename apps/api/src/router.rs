use std::sync::Arc;

use axum::{
    extract::State,
    Json,
    Router,
    routing::get,
};
use serde_json::{json, Value};

use appointment_cell::appointment_routes;
use auth_cell::router::auth_routes;
use booking_wizard_cell::{booking_wizard_routes, WizardState};
use consultant_cell::consultant_routes;
use content_cell::{blog_routes, gallery_routes};
use department_cell::department_routes;
use patient_cell::patient_routes;
use payment_cell::payment_routes;
use shared_config::AppConfig;
use slot_cell::slot_routes;

pub fn create_router(state: Arc<AppConfig>, wizard: WizardState) -> Router {
    let health = Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone());

    Router::new()
        .route("/", get(|| async { "Hospital booking API is running!" }))
        .merge(health)
        .nest("/auth", auth_routes(state.clone()))
        .nest("/departments", department_routes(state.clone()))
        .nest("/consultants", consultant_routes(state.clone()))
        .nest("/slots", slot_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/booking", booking_wizard_routes(wizard))
        .nest("/blogs", blog_routes(state.clone()))
        .nest("/gallery", gallery_routes(state))
}

async fn health_check(State(state): State<Arc<AppConfig>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "configured": state.is_configured(),
        "payments_configured": state.is_payment_configured()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use shared_utils::test_utils::TestConfig;

    fn app() -> Router {
        let config = TestConfig::default().to_arc();
        create_router(config.clone(), WizardState::in_memory(config))
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["payments_configured"], true);
    }

    #[tokio::test]
    async fn test_staff_routes_need_a_token() {
        let response = app()
            .oneshot(Request::builder().uri("/appointments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
