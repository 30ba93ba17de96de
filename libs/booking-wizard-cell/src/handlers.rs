use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::models::WizardAction;
use crate::state::WizardState;

#[axum::debug_handler]
pub async fn start_session(State(state): State<WizardState>) -> Result<Json<Value>, AppError> {
    let session = state.service().start().await?;
    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<WizardState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.service().get(&session_id).await?;
    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn apply_action(
    State(state): State<WizardState>,
    Path(session_id): Path<String>,
    Json(action): Json<WizardAction>,
) -> Result<Json<Value>, AppError> {
    let step = action.step();
    let outcome = state
        .service()
        .apply(&session_id, action, Local::now().naive_local())
        .await?;

    if outcome.session.is_confirmed() {
        info!("Booking session {} confirmed", session_id);
    } else {
        info!("Booking session {} completed {} step", session_id, step);
    }
    Ok(Json(json!(outcome)))
}

#[axum::debug_handler]
pub async fn go_back(
    State(state): State<WizardState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let session = state.service().back(&session_id).await?;
    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn cancel_session(
    State(state): State<WizardState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.service().cancel(&session_id).await?;
    Ok(Json(json!({
        "message": "Booking session cancelled"
    })))
}

#[axum::debug_handler]
pub async fn get_step_options(
    State(state): State<WizardState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let options = state
        .service()
        .options(&session_id, Local::now().naive_local())
        .await?;

    let mut body = json!(options);
    body["can_continue"] = json!(options.can_continue());
    Ok(Json(body))
}
