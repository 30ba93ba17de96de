use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::DepartmentQuery;
use crate::services::DepartmentService;

#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let departments = service.list_departments(query.search.as_deref()).await?;

    Ok(Json(json!({
        "departments": departments,
        "total": departments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_department(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let department = service.get_department(&department_id).await?;
    Ok(Json(json!(department)))
}

#[axum::debug_handler]
pub async fn get_department_services(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let services = service.get_services(&department_id).await?;

    Ok(Json(json!({
        "department_id": department_id,
        "services": services,
        "total": services.len()
    })))
}

#[axum::debug_handler]
pub async fn get_department_consultants(
    State(state): State<Arc<AppConfig>>,
    Path(department_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = DepartmentService::new(&state);
    let consultants = service.get_consultants(&department_id).await?;

    Ok(Json(json!({
        "department_id": department_id,
        "consultants": consultants,
        "total": consultants.len()
    })))
}
