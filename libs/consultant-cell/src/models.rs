use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;
use shared_models::wire::{amount, id_string};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultant {
    #[serde(deserialize_with = "id_string", alias = "ConsultantId", alias = "consultantId")]
    pub id: String,
    #[serde(alias = "ConsultantName", alias = "consultantName")]
    pub name: String,
    #[serde(deserialize_with = "id_string", alias = "DepartmentId", alias = "departmentId")]
    pub department_id: String,
    #[serde(default, alias = "DepartmentName", alias = "departmentName")]
    pub department_name: Option<String>,
    #[serde(default, deserialize_with = "amount", alias = "Fee", alias = "consultationFee")]
    pub fee: f64,
    #[serde(default, alias = "Degree", alias = "professionalDegree")]
    pub degree: Option<String>,
    #[serde(default, alias = "Designation")]
    pub designation: Option<String>,
    #[serde(default, alias = "experienceYears")]
    pub experience_years: Option<i32>,
    #[serde(default, alias = "imageUrl", alias = "photo")]
    pub image_url: Option<String>,
    #[serde(default = "default_active", alias = "isActive")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Consultant {
    /// Fee in the smallest currency unit, as payment gateways expect it.
    pub fn fee_minor_units(&self) -> i64 {
        (self.fee * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultantFilters {
    pub department_id: Option<String>,
    pub search: Option<String>,
    pub include_inactive: Option<bool>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsultantError {
    #[error("Consultant not found")]
    NotFound,

    #[error("Consultant is not accepting appointments")]
    Inactive,

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl ConsultantError {
    pub fn from_upstream(err: anyhow::Error) -> Self {
        if ApiError::is_not_found(&err) {
            ConsultantError::NotFound
        } else {
            ConsultantError::Upstream(err.to_string())
        }
    }
}

impl From<ConsultantError> for AppError {
    fn from(err: ConsultantError) -> Self {
        match err {
            ConsultantError::NotFound => AppError::NotFound("Consultant not found".to_string()),
            ConsultantError::Inactive => AppError::BadRequest(err.to_string()),
            ConsultantError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}
