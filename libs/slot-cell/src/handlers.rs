use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AvailableSlotsQuery, CreateSlotRequest, SlotQuery, SlotRangeRequest, UpdateSlotRequest,
};
use crate::services::SlotService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SlotService::new(&state);
    let slots = service
        .available_slots(&query.consultant_id, query.date, Local::now().naive_local())
        .await?;

    Ok(Json(json!({
        "consultant_id": query.consultant_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len(),
        "can_continue": !slots.is_empty()
    })))
}

// ==============================================================================
// STAFF HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SlotService::new(&state);
    let slots = service.list_slots(&query, Some(auth.token())).await?;

    Ok(Json(json!({
        "slots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn get_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(slot_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SlotService::new(&state);
    let slot = service.get_slot(&slot_id, Some(auth.token())).await?;
    Ok(Json(json!(slot)))
}

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} creating slot for consultant {}", user.id, request.consultant_id);

    let service = SlotService::new(&state);
    let slot = service.create_slot(request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "slot": slot
    })))
}

#[axum::debug_handler]
pub async fn update_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(slot_id): Path<String>,
    Json(request): Json<UpdateSlotRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} updating slot {}", user.id, slot_id);

    let service = SlotService::new(&state);
    let slot = service.update_slot(&slot_id, request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "slot": slot
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(slot_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    info!("User {} deleting slot {}", user.id, slot_id);

    let service = SlotService::new(&state);
    service.delete_slot(&slot_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "slot_id": slot_id
    })))
}

#[axum::debug_handler]
pub async fn preview_slot_range(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<SlotRangeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SlotService::new(&state);
    let preview = service.preview_range(&request)?;
    Ok(Json(json!(preview)))
}

#[axum::debug_handler]
pub async fn create_slot_range(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SlotRangeRequest>,
) -> Result<Json<Value>, AppError> {
    info!(
        "User {} creating slot range {}..{} for consultant {}",
        user.id, request.from_date, request.to_date, request.consultant_id
    );

    let service = SlotService::new(&state);
    let result = service.create_range(request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "slots": result.slots,
        "created_total": result.created_total,
        "preview_total": result.preview_total,
        "diverged": result.diverged
    })))
}
