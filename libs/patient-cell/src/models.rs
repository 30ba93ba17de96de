use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientData {
    #[serde(alias = "MRNo", alias = "mrNo", alias = "mrno")]
    pub mr_no: String,
    #[serde(alias = "PatientName", alias = "patientName", alias = "Name")]
    pub name: String,
    #[serde(default, alias = "MobileNo", alias = "mobile", alias = "Phone")]
    pub phone: Option<String>,
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "Gender")]
    pub gender: Option<String>,
    #[serde(default, alias = "Age")]
    pub age: Option<u8>,
    #[serde(default, alias = "DOB", alias = "dateOfBirth")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, alias = "Address")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mr_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free text matched by the hospital API against any of the above.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Provide at least one of mr_no, phone, name or q")]
    MissingCriteria,

    #[error("Search text must be at least {0} characters")]
    QueryTooShort(usize),

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl PatientError {
    pub fn from_upstream(err: anyhow::Error) -> Self {
        if ApiError::is_not_found(&err) {
            PatientError::NotFound
        } else {
            PatientError::Upstream(err.to_string())
        }
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::MissingCriteria
            | PatientError::QueryTooShort(_)
            | PatientError::InvalidPhone => AppError::BadRequest(err.to_string()),
            PatientError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}
