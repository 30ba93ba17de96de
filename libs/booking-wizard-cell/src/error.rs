use chrono::NaiveDate;
use thiserror::Error;

use appointment_cell::AppointmentError;
use consultant_cell::ConsultantError;
use department_cell::DepartmentError;
use patient_cell::PatientError;
use payment_cell::PaymentError;
use shared_models::error::AppError;
use slot_cell::SlotError;

use crate::models::WizardStep;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("Booking session not found or expired")]
    SessionNotFound,

    #[error("Complete the {current} step before the {requested} step")]
    StepNotReached { requested: WizardStep, current: WizardStep },

    #[error("Booking is already confirmed")]
    AlreadyConfirmed,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("No slots available on {0}, please choose another date")]
    NoAvailability(NaiveDate),

    #[error("Selected slot is no longer available")]
    SlotUnavailable,

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Hospital API error: {0}")]
    Upstream(String),

    #[error("Session store error: {0}")]
    Store(String),
}

impl From<DepartmentError> for WizardError {
    fn from(err: DepartmentError) -> Self {
        match err {
            DepartmentError::NotFound => WizardError::NotFound("Department"),
            DepartmentError::Upstream(msg) => WizardError::Upstream(msg),
        }
    }
}

impl From<ConsultantError> for WizardError {
    fn from(err: ConsultantError) -> Self {
        match err {
            ConsultantError::NotFound => WizardError::NotFound("Doctor"),
            ConsultantError::Inactive => WizardError::Validation(err.to_string()),
            ConsultantError::Upstream(msg) => WizardError::Upstream(msg),
        }
    }
}

impl From<SlotError> for WizardError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::NotFound => WizardError::NotFound("Slot"),
            SlotError::SlotFull | SlotError::Conflict(_) => WizardError::SlotUnavailable,
            other => WizardError::Upstream(other.to_string()),
        }
    }
}

impl From<AppointmentError> for WizardError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => WizardError::NotFound("Appointment"),
            AppointmentError::SlotUnavailable | AppointmentError::Conflict(_) => WizardError::SlotUnavailable,
            AppointmentError::Validation(msg) => WizardError::Validation(msg),
            other => WizardError::Upstream(other.to_string()),
        }
    }
}

impl From<PatientError> for WizardError {
    fn from(err: PatientError) -> Self {
        match err {
            // never tell the caller which half of MRNo + phone was wrong
            PatientError::NotFound | PatientError::InvalidPhone => WizardError::Validation(
                "MRNo and phone number do not match our records".to_string(),
            ),
            PatientError::MissingCriteria | PatientError::QueryTooShort(_) => {
                WizardError::Validation(err.to_string())
            }
            PatientError::Upstream(msg) => WizardError::Upstream(msg),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::SessionNotFound | WizardError::NotFound(_) => AppError::NotFound(err.to_string()),
            WizardError::StepNotReached { .. } | WizardError::NoAvailability(_) => {
                AppError::BadRequest(err.to_string())
            }
            WizardError::AlreadyConfirmed | WizardError::SlotUnavailable => AppError::Conflict(err.to_string()),
            WizardError::Validation(msg) => AppError::ValidationError(msg),
            WizardError::Payment(payment) => payment.into(),
            WizardError::Upstream(msg) => AppError::ExternalService(msg),
            WizardError::Store(msg) => AppError::Internal(msg),
        }
    }
}
