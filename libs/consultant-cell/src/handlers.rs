use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::ConsultantFilters;
use crate::services::ConsultantService;

#[derive(Debug, Deserialize)]
pub struct SlotDateQuery {
    pub date: NaiveDate,
}

#[axum::debug_handler]
pub async fn list_consultants(
    State(state): State<Arc<AppConfig>>,
    Query(filters): Query<ConsultantFilters>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultantService::new(&state);
    let consultants = service.list_consultants(&filters).await?;

    Ok(Json(json!({
        "consultants": consultants,
        "total": consultants.len()
    })))
}

#[axum::debug_handler]
pub async fn get_consultant(
    State(state): State<Arc<AppConfig>>,
    Path(consultant_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultantService::new(&state);
    let consultant = service.get_consultant(&consultant_id).await?;
    Ok(Json(json!(consultant)))
}

#[axum::debug_handler]
pub async fn get_consultant_slots(
    State(state): State<Arc<AppConfig>>,
    Path(consultant_id): Path<String>,
    Query(query): Query<SlotDateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultantService::new(&state);
    let slots = service
        .available_slots(&consultant_id, query.date, Local::now().naive_local())
        .await?;

    Ok(Json(json!({
        "consultant_id": consultant_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len()
    })))
}
