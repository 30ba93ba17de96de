use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::Appointment;
use consultant_cell::Consultant;
use department_cell::Department;
use payment_cell::PaymentOrder;
use shared_utils::validation::{is_valid_email, normalize_phone, require_non_empty};
use slot_cell::Slot;

use crate::error::WizardError;

// ==============================================================================
// WIZARD STEPS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Department,
    Doctor,
    Date,
    Slot,
    Patient,
    Payment,
    Confirmation,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        WizardStep::Department,
        WizardStep::Doctor,
        WizardStep::Date,
        WizardStep::Slot,
        WizardStep::Patient,
        WizardStep::Payment,
        WizardStep::Confirmation,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStep> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WizardStep::Department => "department",
            WizardStep::Doctor => "doctor",
            WizardStep::Date => "date",
            WizardStep::Slot => "slot",
            WizardStep::Patient => "patient",
            WizardStep::Payment => "payment",
            WizardStep::Confirmation => "confirmation",
        };
        write!(f, "{}", name)
    }
}

// ==============================================================================
// SESSION
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSession {
    pub id: String,
    pub step: WizardStep,
    pub department_id: Option<String>,
    pub consultant_id: Option<String>,
    pub consultant_fee: Option<f64>,
    pub date: Option<NaiveDate>,
    pub slot_id: Option<String>,
    pub slot_start: Option<NaiveDateTime>,
    pub patient: Option<PatientDetails>,
    /// Pending appointment created when payment starts; reused on retries.
    pub temp_appointment_id: Option<String>,
    pub payment_order_id: Option<String>,
    pub appointment: Option<Appointment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            step: WizardStep::Department,
            department_id: None,
            consultant_id: None,
            consultant_fee: None,
            date: None,
            slot_id: None,
            slot_start: None,
            patient: None,
            temp_appointment_id: None,
            payment_order_id: None,
            appointment: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves back to `step`, dropping every choice made at that step or later.
    pub fn rewind_to(&mut self, step: WizardStep) {
        if step <= WizardStep::Department {
            self.department_id = None;
        }
        if step <= WizardStep::Doctor {
            self.consultant_id = None;
            self.consultant_fee = None;
        }
        if step <= WizardStep::Date {
            self.date = None;
        }
        if step <= WizardStep::Slot {
            self.slot_id = None;
            self.slot_start = None;
        }
        if step <= WizardStep::Patient {
            self.patient = None;
        }
        if step <= WizardStep::Payment {
            self.temp_appointment_id = None;
            self.payment_order_id = None;
        }
        self.appointment = None;
        self.step = step;
    }

    pub fn is_confirmed(&self) -> bool {
        self.step == WizardStep::Confirmation
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new()
    }
}

// ==============================================================================
// PATIENT DETAILS
// ==============================================================================

pub const GENDERS: [&str; 3] = ["male", "female", "other"];
pub const MAX_AGE: u8 = 120;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    #[serde(default)]
    pub mr_no: Option<String>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub gender: String,
    pub age: u8,
}

impl PatientDetails {
    /// Validates and normalises in place: trimmed name, bare 10 digit phone,
    /// lowercase gender, empty optionals dropped.
    pub fn validate(&mut self) -> Result<(), WizardError> {
        require_non_empty("name", &self.name).map_err(WizardError::Validation)?;
        self.name = self.name.trim().to_string();

        self.phone = normalize_phone(&self.phone).ok_or_else(|| {
            WizardError::Validation("phone must be a 10 digit mobile number".to_string())
        })?;

        self.email = self
            .email
            .take()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(ref email) = self.email {
            if !is_valid_email(email) {
                return Err(WizardError::Validation("email is not a valid address".to_string()));
            }
        }

        self.gender = self.gender.trim().to_lowercase();
        if !GENDERS.contains(&self.gender.as_str()) {
            return Err(WizardError::Validation("gender must be male, female or other".to_string()));
        }

        if self.age > MAX_AGE {
            return Err(WizardError::Validation(format!("age must be between 0 and {}", MAX_AGE)));
        }

        self.mr_no = self
            .mr_no
            .take()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        Ok(())
    }
}

// ==============================================================================
// ACTIONS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    SelectDepartment { department_id: String },
    SelectDoctor { consultant_id: String },
    SelectDate { date: NaiveDate },
    SelectSlot { slot_id: String },
    SubmitPatient { patient: PatientDetails },
    StartPayment,
    ConfirmPayment {
        razorpay_order_id: String,
        razorpay_payment_id: String,
        razorpay_signature: String,
    },
}

impl WizardAction {
    /// The step at which this action is taken.
    pub fn step(&self) -> WizardStep {
        match self {
            WizardAction::SelectDepartment { .. } => WizardStep::Department,
            WizardAction::SelectDoctor { .. } => WizardStep::Doctor,
            WizardAction::SelectDate { .. } => WizardStep::Date,
            WizardAction::SelectSlot { .. } => WizardStep::Slot,
            WizardAction::SubmitPatient { .. } => WizardStep::Patient,
            WizardAction::StartPayment | WizardAction::ConfirmPayment { .. } => WizardStep::Payment,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub session: BookingSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_order: Option<PaymentOrder>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub available_slots: usize,
    pub bookable: bool,
}

/// The choices offered at the session's current step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", content = "options", rename_all = "snake_case")]
pub enum StepOptions {
    Department(Vec<Department>),
    Doctor(Vec<Consultant>),
    Date(Vec<DateAvailability>),
    Slot(Vec<Slot>),
    Patient,
    Payment { fee: Option<f64> },
    Confirmation,
}

impl StepOptions {
    /// False when the step offers nothing to pick, e.g. a day without free slots.
    pub fn can_continue(&self) -> bool {
        match self {
            StepOptions::Department(departments) => !departments.is_empty(),
            StepOptions::Doctor(consultants) => !consultants.is_empty(),
            StepOptions::Date(days) => days.iter().any(|d| d.bookable),
            StepOptions::Slot(slots) => !slots.is_empty(),
            StepOptions::Patient | StepOptions::Payment { .. } => true,
            StepOptions::Confirmation => false,
        }
    }
}
