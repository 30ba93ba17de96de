use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;
use shared_models::wire::{id_string, opt_amount, opt_clock_time, opt_id_string};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    #[serde(deserialize_with = "id_string", alias = "AppointmentId", alias = "appointmentId")]
    pub id: String,
    #[serde(default, alias = "AppointmentNo", alias = "appointmentNo")]
    pub appointment_no: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string", alias = "PatientId", alias = "patientId")]
    pub patient_id: Option<String>,
    #[serde(default, alias = "MRNo", alias = "mrNo")]
    pub mr_no: Option<String>,
    #[serde(alias = "PatientName", alias = "patientName")]
    pub patient_name: String,
    #[serde(default, alias = "PatientPhone", alias = "patientPhone", alias = "MobileNo")]
    pub patient_phone: Option<String>,
    #[serde(deserialize_with = "id_string", alias = "ConsultantId", alias = "consultantId")]
    pub consultant_id: String,
    #[serde(default, alias = "ConsultantName", alias = "consultantName")]
    pub consultant_name: Option<String>,
    #[serde(deserialize_with = "id_string", alias = "SlotId", alias = "slotId")]
    pub slot_id: String,
    #[serde(alias = "AppointmentDate", alias = "appointmentDate")]
    pub appointment_date: NaiveDate,
    #[serde(default, with = "opt_clock_time", alias = "StartTime", alias = "startTime")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, alias = "Status")]
    pub status: AppointmentStatus,
    #[serde(default, alias = "PaymentStatus", alias = "paymentStatus")]
    pub payment_status: PaymentStatus,
    #[serde(default, deserialize_with = "opt_amount", alias = "Amount", alias = "fee")]
    pub amount: Option<f64>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Scheduled", alias = "confirmed", alias = "Confirmed", alias = "booked")]
    Scheduled,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Cancelled", alias = "canceled")]
    Cancelled,
    #[serde(alias = "Refunded")]
    Refunded,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[serde(alias = "Pending", alias = "unpaid")]
    Pending,
    #[serde(alias = "Paid", alias = "captured", alias = "success")]
    Paid,
    #[serde(alias = "Failed")]
    Failed,
    #[serde(alias = "Refunded")]
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilters {
    pub status: Option<AppointmentStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub consultant_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr_no: Option<String>,
    pub patient_name: String,
    pub patient_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    pub consultant_id: String,
    pub slot_id: String,
    pub appointment_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAppointmentRequest {
    pub slot_id: String,
    pub appointment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefundRequest {
    pub reason: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentStats {
    pub total: usize,
    pub by_status: BTreeMap<AppointmentStatus, usize>,
    pub by_payment_status: BTreeMap<PaymentStatus, usize>,
    /// Sum of amounts on paid appointments.
    pub collected: f64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Cannot move a {from} appointment to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Only paid appointments can be refunded (payment status is {0})")]
    NotPaid(PaymentStatus),

    #[error("Selected slot has no remaining capacity")]
    SlotUnavailable,

    #[error("Appointment is already in slot {0}")]
    SameSlot(String),

    #[error("Invalid appointment: {0}")]
    Validation(String),

    #[error("Appointment conflicts with an existing booking: {0}")]
    Conflict(String),

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl AppointmentError {
    pub fn from_upstream(err: anyhow::Error) -> Self {
        if ApiError::is_not_found(&err) {
            AppointmentError::NotFound
        } else if ApiError::is_conflict(&err) {
            AppointmentError::Conflict(err.to_string())
        } else {
            AppointmentError::Upstream(err.to_string())
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::NotPaid(_)
            | AppointmentError::SameSlot(_) => AppError::BadRequest(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::SlotUnavailable | AppointmentError::Conflict(_) => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_upstream_shape() {
        let appointment: Appointment = serde_json::from_value(json!({
            "AppointmentId": 991,
            "AppointmentNo": "APT-991",
            "MRNo": "MR1001",
            "PatientName": "Asha Rao",
            "ConsultantId": 4,
            "SlotId": 77,
            "AppointmentDate": "2030-01-15",
            "StartTime": "10:30",
            "Status": "Confirmed",
            "PaymentStatus": "Paid",
            "Amount": "500"
        }))
        .unwrap();

        assert_eq!(appointment.id, "991");
        assert_eq!(appointment.slot_id, "77");
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert!(appointment.is_paid());
        assert_eq!(appointment.amount, Some(500.0));
        assert_eq!(appointment.start_time, NaiveTime::from_hms_opt(10, 30, 0));
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = AppointmentError::SlotUnavailable.into();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

        let err: AppError = AppointmentError::NotPaid(PaymentStatus::Pending).into();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
