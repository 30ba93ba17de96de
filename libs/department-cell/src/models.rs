use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;
use shared_models::wire::{id_string, opt_id_string};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    #[serde(deserialize_with = "id_string", alias = "DepartmentId", alias = "departmentId")]
    pub id: String,
    #[serde(alias = "DepartmentName", alias = "departmentName")]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl", alias = "icon")]
    pub image_url: Option<String>,
    #[serde(default = "default_active", alias = "isActive")]
    pub is_active: bool,
    #[serde(default)]
    pub services: Vec<HospitalService>,
}

fn default_active() -> bool {
    true
}

/// A treatment or service offered by a department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalService {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub department_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentQuery {
    pub search: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DepartmentError {
    #[error("Department not found")]
    NotFound,

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl DepartmentError {
    pub fn from_upstream(err: anyhow::Error) -> Self {
        if ApiError::is_not_found(&err) {
            DepartmentError::NotFound
        } else {
            DepartmentError::Upstream(err.to_string())
        }
    }
}

impl From<DepartmentError> for AppError {
    fn from(err: DepartmentError) -> Self {
        match err {
            DepartmentError::NotFound => AppError::NotFound("Department not found".to_string()),
            DepartmentError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}
