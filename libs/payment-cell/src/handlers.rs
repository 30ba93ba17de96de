use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::VerifyPaymentRequest;
use crate::services::PaymentService;

#[axum::debug_handler]
pub async fn initiate_payment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&state);
    let order = service.initiate_payment(&appointment_id).await?;
    Ok(Json(json!(order)))
}

#[axum::debug_handler]
pub async fn verify_payment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&state);
    let verification = service.verify_payment(&appointment_id, request).await?;
    Ok(Json(json!(verification)))
}
