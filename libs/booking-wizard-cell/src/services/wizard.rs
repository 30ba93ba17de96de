use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use futures::TryFutureExt;
use tracing::{debug, info, warn};

use appointment_cell::{AppointmentService, CreateAppointmentRequest};
use consultant_cell::{ConsultantFilters, ConsultantService};
use department_cell::DepartmentService;
use patient_cell::PatientService;
use payment_cell::{PaymentOrder, PaymentService, VerifyPaymentRequest};
use shared_config::AppConfig;
use slot_cell::{filter_available, SlotQuery, SlotService};

use crate::error::WizardError;
use crate::models::{
    ActionOutcome, BookingSession, DateAvailability, PatientDetails, StepOptions, WizardAction,
    WizardStep,
};
use crate::services::store::WizardStore;

/// Days offered on the date step, today included.
pub const AVAILABILITY_WINDOW_DAYS: i64 = 14;

pub struct BookingWizardService {
    config: Arc<AppConfig>,
    store: Arc<dyn WizardStore>,
}

impl BookingWizardService {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn WizardStore>) -> Self {
        Self { config, store }
    }

    pub async fn start(&self) -> Result<BookingSession, WizardError> {
        let session = BookingSession::new();
        self.store.put(&session).await?;
        info!("Started booking session {}", session.id);
        Ok(session)
    }

    pub async fn get(&self, session_id: &str) -> Result<BookingSession, WizardError> {
        self.store
            .get(session_id)
            .await?
            .ok_or(WizardError::SessionNotFound)
    }

    /// Applies one action. Actions for an earlier step rewind the session first;
    /// nothing is stored unless the whole action succeeds.
    pub async fn apply(
        &self,
        session_id: &str,
        action: WizardAction,
        now: NaiveDateTime,
    ) -> Result<ActionOutcome, WizardError> {
        let mut session = self.get(session_id).await?;
        if session.is_confirmed() {
            return Err(WizardError::AlreadyConfirmed);
        }

        let requested = action.step();
        if requested > session.step {
            return Err(WizardError::StepNotReached { requested, current: session.step });
        }
        if requested < session.step {
            debug!("Session {} rewinding from {} to {}", session.id, session.step, requested);
            if let Some(ref appointment_id) = session.temp_appointment_id {
                warn!("Session {} abandons pending appointment {}", session.id, appointment_id);
            }
            session.rewind_to(requested);
        }

        let mut payment_order = None;
        match action {
            WizardAction::SelectDepartment { department_id } => {
                self.select_department(&mut session, &department_id).await?
            }
            WizardAction::SelectDoctor { consultant_id } => {
                self.select_doctor(&mut session, &consultant_id).await?
            }
            WizardAction::SelectDate { date } => self.select_date(&mut session, date, now).await?,
            WizardAction::SelectSlot { slot_id } => self.select_slot(&mut session, &slot_id, now).await?,
            WizardAction::SubmitPatient { patient } => self.submit_patient(&mut session, patient).await?,
            WizardAction::StartPayment => {
                payment_order = Some(self.start_payment(&mut session, now).await?);
            }
            WizardAction::ConfirmPayment {
                razorpay_order_id,
                razorpay_payment_id,
                razorpay_signature,
            } => {
                let request = VerifyPaymentRequest {
                    razorpay_order_id,
                    razorpay_payment_id,
                    razorpay_signature,
                };
                self.confirm_payment(&mut session, request).await?
            }
        }

        session.touch();
        self.store.put(&session).await?;
        Ok(ActionOutcome { session, payment_order })
    }

    /// One step back, forgetting the choice made there.
    pub async fn back(&self, session_id: &str) -> Result<BookingSession, WizardError> {
        let mut session = self.get(session_id).await?;
        if session.is_confirmed() {
            return Err(WizardError::AlreadyConfirmed);
        }

        let previous = session
            .step
            .previous()
            .ok_or_else(|| WizardError::Validation("Already at the first step".to_string()))?;
        session.rewind_to(previous);
        session.touch();
        self.store.put(&session).await?;
        Ok(session)
    }

    pub async fn cancel(&self, session_id: &str) -> Result<(), WizardError> {
        let session = self.get(session_id).await?;
        if !session.is_confirmed() {
            if let Some(ref appointment_id) = session.temp_appointment_id {
                warn!("Cancelled session {} leaves pending appointment {}", session.id, appointment_id);
            }
        }

        if !self.store.delete(session_id).await? {
            return Err(WizardError::SessionNotFound);
        }
        info!("Cancelled booking session {}", session_id);
        Ok(())
    }

    pub async fn options(&self, session_id: &str, now: NaiveDateTime) -> Result<StepOptions, WizardError> {
        let session = self.get(session_id).await?;

        let options = match session.step {
            WizardStep::Department => {
                let departments = DepartmentService::new(&self.config).list_departments(None).await?;
                StepOptions::Department(departments)
            }
            WizardStep::Doctor => {
                let filters = ConsultantFilters {
                    department_id: Some(required(&session.department_id, WizardStep::Doctor)?.to_string()),
                    ..ConsultantFilters::default()
                };
                let consultants = ConsultantService::new(&self.config).list_consultants(&filters).await?;
                StepOptions::Doctor(consultants)
            }
            WizardStep::Date => {
                let consultant_id = required(&session.consultant_id, WizardStep::Date)?;
                StepOptions::Date(self.date_availability(consultant_id, now).await?)
            }
            WizardStep::Slot => {
                let consultant_id = required(&session.consultant_id, WizardStep::Slot)?;
                let date = session.date.ok_or(WizardError::StepNotReached {
                    requested: WizardStep::Slot,
                    current: WizardStep::Date,
                })?;
                let slots = ConsultantService::new(&self.config)
                    .available_slots(consultant_id, date, now)
                    .await?;
                StepOptions::Slot(slots)
            }
            WizardStep::Patient => StepOptions::Patient,
            WizardStep::Payment => StepOptions::Payment { fee: session.consultant_fee },
            WizardStep::Confirmation => StepOptions::Confirmation,
        };

        Ok(options)
    }

    // ==========================================================================
    // STEP HANDLERS
    // ==========================================================================

    async fn select_department(
        &self,
        session: &mut BookingSession,
        department_id: &str,
    ) -> Result<(), WizardError> {
        let department = DepartmentService::new(&self.config).get_department(department_id).await?;
        if !department.is_active {
            return Err(WizardError::Validation(format!("{} is not taking bookings", department.name)));
        }

        session.department_id = Some(department.id);
        session.step = WizardStep::Doctor;
        Ok(())
    }

    async fn select_doctor(
        &self,
        session: &mut BookingSession,
        consultant_id: &str,
    ) -> Result<(), WizardError> {
        let department_id = required(&session.department_id, WizardStep::Doctor)?.to_string();

        let consultants = ConsultantService::new(&self.config);
        let departments = DepartmentService::new(&self.config);
        let (consultant, department) = futures::try_join!(
            consultants.get_bookable_consultant(consultant_id).map_err(WizardError::from),
            departments.get_department(&department_id).map_err(WizardError::from),
        )?;

        if consultant.department_id != department.id {
            return Err(WizardError::Validation(format!(
                "{} does not consult in {}",
                consultant.name, department.name
            )));
        }

        session.consultant_id = Some(consultant.id);
        session.consultant_fee = Some(consultant.fee);
        session.step = WizardStep::Date;
        Ok(())
    }

    async fn select_date(
        &self,
        session: &mut BookingSession,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<(), WizardError> {
        if date < now.date() {
            return Err(WizardError::Validation("Appointment date cannot be in the past".to_string()));
        }

        let consultant_id = required(&session.consultant_id, WizardStep::Date)?;
        let slots = ConsultantService::new(&self.config)
            .available_slots(consultant_id, date, now)
            .await?;
        if slots.is_empty() {
            debug!("No availability for consultant {} on {}", consultant_id, date);
            return Err(WizardError::NoAvailability(date));
        }

        session.date = Some(date);
        session.step = WizardStep::Slot;
        Ok(())
    }

    async fn select_slot(
        &self,
        session: &mut BookingSession,
        slot_id: &str,
        now: NaiveDateTime,
    ) -> Result<(), WizardError> {
        let consultant_id = required(&session.consultant_id, WizardStep::Slot)?;
        let slot = SlotService::new(&self.config).get_slot(slot_id, None).await?;

        if slot.consultant_id != consultant_id || Some(slot.slot_date) != session.date {
            return Err(WizardError::Validation(
                "Slot does not match the selected doctor and date".to_string(),
            ));
        }
        if !slot.is_bookable_at(now) {
            return Err(WizardError::SlotUnavailable);
        }

        session.slot_start = Some(slot.starts_at());
        session.slot_id = Some(slot.id);
        session.step = WizardStep::Patient;
        Ok(())
    }

    async fn submit_patient(
        &self,
        session: &mut BookingSession,
        mut patient: PatientDetails,
    ) -> Result<(), WizardError> {
        patient.validate()?;

        if let Some(ref mr_no) = patient.mr_no {
            let record = PatientService::new(&self.config)
                .find_returning_patient(mr_no, &patient.phone)
                .await?;
            debug!("Session {} matched returning patient {}", session.id, record.mr_no);
            if patient.email.is_none() {
                patient.email = record.email;
            }
            patient.mr_no = Some(record.mr_no);
        }

        session.patient = Some(patient);
        session.step = WizardStep::Payment;
        Ok(())
    }

    /// Creates the pending appointment once, then opens a gateway order for it.
    async fn start_payment(
        &self,
        session: &mut BookingSession,
        now: NaiveDateTime,
    ) -> Result<PaymentOrder, WizardError> {
        let appointment_id = match session.temp_appointment_id.clone() {
            Some(existing) => {
                debug!("Session {} reuses pending appointment {}", session.id, existing);
                existing
            }
            None => {
                let request = appointment_request(session)?;
                let appointment = AppointmentService::new(&self.config)
                    .create_appointment(request, None, now)
                    .await?;

                session.temp_appointment_id = Some(appointment.id.clone());
                // keep the id even if opening the order fails below
                session.touch();
                self.store.put(session).await?;
                appointment.id
            }
        };

        let order = PaymentService::new(&self.config).initiate_payment(&appointment_id).await?;
        session.payment_order_id = Some(order.order_id.clone());
        Ok(order)
    }

    async fn confirm_payment(
        &self,
        session: &mut BookingSession,
        request: VerifyPaymentRequest,
    ) -> Result<(), WizardError> {
        let appointment_id = session
            .temp_appointment_id
            .clone()
            .ok_or_else(|| WizardError::Validation("Start the payment before confirming it".to_string()))?;

        if let Some(ref order_id) = session.payment_order_id {
            if *order_id != request.razorpay_order_id {
                return Err(WizardError::Validation(
                    "Payment order does not belong to this booking".to_string(),
                ));
            }
        }

        let verification = PaymentService::new(&self.config)
            .verify_payment(&appointment_id, request)
            .await?;
        info!(
            "Session {} paid with {} for appointment {}",
            session.id, verification.payment_id, appointment_id
        );

        session.appointment = match AppointmentService::new(&self.config)
            .get_appointment(&appointment_id, None)
            .await
        {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                warn!("Paid appointment {} could not be reloaded: {}", appointment_id, e);
                None
            }
        };
        session.step = WizardStep::Confirmation;
        Ok(())
    }

    async fn date_availability(
        &self,
        consultant_id: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<DateAvailability>, WizardError> {
        let today = now.date();
        let last = today + Duration::days(AVAILABILITY_WINDOW_DAYS - 1);

        let query = SlotQuery {
            consultant_id: Some(consultant_id.to_string()),
            from: Some(today),
            to: Some(last),
            ..SlotQuery::default()
        };
        let slots = SlotService::new(&self.config).list_slots(&query, None).await?;

        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for slot in filter_available(slots, now) {
            if slot.consultant_id == consultant_id {
                *per_day.entry(slot.slot_date).or_insert(0) += 1;
            }
        }

        Ok(today
            .iter_days()
            .take(AVAILABILITY_WINDOW_DAYS as usize)
            .map(|date| {
                let available_slots = per_day.get(&date).copied().unwrap_or(0);
                DateAvailability {
                    date,
                    available_slots,
                    bookable: available_slots > 0,
                }
            })
            .collect())
    }
}

fn required(field: &Option<String>, step: WizardStep) -> Result<&str, WizardError> {
    field.as_deref().ok_or(WizardError::StepNotReached {
        requested: step,
        current: step.previous().unwrap_or(WizardStep::Department),
    })
}

fn appointment_request(session: &BookingSession) -> Result<CreateAppointmentRequest, WizardError> {
    let missing = |step: WizardStep| WizardError::StepNotReached {
        requested: WizardStep::Payment,
        current: step,
    };

    let patient = session.patient.as_ref().ok_or_else(|| missing(WizardStep::Patient))?;
    Ok(CreateAppointmentRequest {
        patient_id: None,
        mr_no: patient.mr_no.clone(),
        patient_name: patient.name.clone(),
        patient_phone: patient.phone.clone(),
        patient_email: patient.email.clone(),
        gender: Some(patient.gender.clone()),
        age: Some(patient.age),
        consultant_id: session.consultant_id.clone().ok_or_else(|| missing(WizardStep::Doctor))?,
        slot_id: session.slot_id.clone().ok_or_else(|| missing(WizardStep::Slot))?,
        appointment_date: session.date.ok_or_else(|| missing(WizardStep::Date))?,
        amount: session.consultant_fee,
    })
}
