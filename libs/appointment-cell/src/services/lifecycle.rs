use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, PaymentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Scheduled,
                AppointmentStatus::Cancelled,
            ],
            // rescheduling keeps the appointment scheduled
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Cancelled => vec![AppointmentStatus::Refunded],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Refunded => vec![],
        }
    }

    pub fn validate_complete(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Completed)
    }

    pub fn validate_schedule(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Scheduled)
    }

    pub fn validate_cancel(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Cancelled)
    }

    /// Refunds need a captured payment on top of a cancelled appointment.
    pub fn validate_refund(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        if appointment.payment_status != PaymentStatus::Paid {
            return Err(AppointmentError::NotPaid(appointment.payment_status));
        }
        self.validate_status_transition(&appointment.status, &AppointmentStatus::Refunded)
    }

    pub fn is_terminal(&self, status: &AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
