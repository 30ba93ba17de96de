use chrono::NaiveDateTime;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};
use shared_utils::validation::{is_valid_email, normalize_phone, require_non_empty};
use slot_cell::{SlotError, SlotService};

use crate::models::{
    Appointment, AppointmentError, AppointmentFilters, AppointmentStats, AppointmentStatus,
    CancelAppointmentRequest, CreateAppointmentRequest, PaymentStatus, RefundRequest,
    ScheduleAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::search::{apply_filters, summarize};

pub struct AppointmentService {
    api: HospitalApiClient,
    slots: SlotService,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
            slots: SlotService::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn list_appointments(
        &self,
        filters: &AppointmentFilters,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/appointments{}", upstream_query(filters));
        debug!("Fetching appointments: {}", path);

        let result: Value = self.api
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(AppointmentError::from_upstream)?;

        let appointments = parse_appointments(result)?;
        Ok(apply_filters(appointments, filters))
    }

    pub async fn get_appointment(
        &self,
        appointment_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let result: Value = self.api
            .request(Method::GET, &appointment_path(appointment_id, None), auth_token, None)
            .await
            .map_err(AppointmentError::from_upstream)?;

        parse_appointment(result)
    }

    /// Creates a pending appointment in a slot with remaining capacity.
    /// Without a staff token the hospital API key alone authorises the call.
    pub async fn create_appointment(
        &self,
        mut request: CreateAppointmentRequest,
        auth_token: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        validate_create(&mut request)?;

        let slot = self.slots
            .get_slot(&request.slot_id, auth_token)
            .await
            .map_err(slot_error)?;

        if slot.consultant_id != request.consultant_id || slot.slot_date != request.appointment_date {
            return Err(AppointmentError::Validation(
                "slot does not belong to the selected consultant and date".to_string(),
            ));
        }
        if !slot.is_bookable_at(now) {
            return Err(AppointmentError::SlotUnavailable);
        }

        let mut body = serde_json::to_value(&request)
            .map_err(|e| AppointmentError::Upstream(e.to_string()))?;
        if let Value::Object(ref mut map) = body {
            map.insert("start_time".to_string(), json!(slot.start_time.format("%H:%M:%S").to_string()));
            map.insert("status".to_string(), json!(AppointmentStatus::Pending));
            map.insert("payment_status".to_string(), json!(PaymentStatus::Pending));
        }

        let result: Value = self.api
            .request(Method::POST, "/appointments", auth_token, Some(body))
            .await
            .map_err(AppointmentError::from_upstream)?;

        let appointment = parse_appointment(result)?;
        info!(
            "Created appointment {} for consultant {} in slot {}",
            appointment.id, appointment.consultant_id, appointment.slot_id
        );
        Ok(appointment)
    }

    pub async fn complete_appointment(
        &self,
        appointment_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, Some(auth_token)).await?;
        self.lifecycle.validate_complete(&current)?;

        let result: Value = self.api
            .request(
                Method::POST,
                &appointment_path(appointment_id, Some("complete")),
                Some(auth_token),
                Some(json!({})),
            )
            .await
            .map_err(AppointmentError::from_upstream)?;

        info!("Completed appointment {}", appointment_id);
        Ok(updated_or(result, current, |a| a.status = AppointmentStatus::Completed))
    }

    pub async fn refund_appointment(
        &self,
        appointment_id: &str,
        request: RefundRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, Some(auth_token)).await?;
        self.lifecycle.validate_refund(&current)?;

        if let Some(amount) = request.amount {
            validate_refund_amount(amount, current.amount)?;
        }

        let body = serde_json::to_value(&request)
            .map_err(|e| AppointmentError::Upstream(e.to_string()))?;

        let result: Value = self.api
            .request(
                Method::POST,
                &appointment_path(appointment_id, Some("refund")),
                Some(auth_token),
                Some(body),
            )
            .await
            .map_err(AppointmentError::from_upstream)?;

        info!("Refunded appointment {}", appointment_id);
        Ok(updated_or(result, current, |a| {
            a.status = AppointmentStatus::Refunded;
            a.payment_status = PaymentStatus::Refunded;
        }))
    }

    /// Schedules a pending appointment or moves a scheduled one to another slot.
    pub async fn schedule_appointment(
        &self,
        appointment_id: &str,
        request: ScheduleAppointmentRequest,
        auth_token: &str,
        now: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        require_non_empty("slot_id", &request.slot_id).map_err(AppointmentError::Validation)?;

        let current = self.get_appointment(appointment_id, Some(auth_token)).await?;
        self.lifecycle.validate_schedule(&current)?;

        if current.status == AppointmentStatus::Scheduled && current.slot_id == request.slot_id {
            return Err(AppointmentError::SameSlot(request.slot_id));
        }

        let slot = self.slots
            .get_slot(&request.slot_id, Some(auth_token))
            .await
            .map_err(slot_error)?;

        if let Some(date) = request.appointment_date {
            if date != slot.slot_date {
                return Err(AppointmentError::Validation(format!(
                    "slot {} is on {}, not {}",
                    slot.id, slot.slot_date, date
                )));
            }
        }
        if !slot.is_bookable_at(now) {
            warn!("Slot {} cannot take appointment {}", slot.id, appointment_id);
            return Err(AppointmentError::SlotUnavailable);
        }

        let body = json!({
            "slot_id": slot.id,
            "appointment_date": slot.slot_date,
            "start_time": slot.start_time.format("%H:%M:%S").to_string(),
        });

        let result: Value = self.api
            .request(
                Method::POST,
                &appointment_path(appointment_id, Some("schedule")),
                Some(auth_token),
                Some(body),
            )
            .await
            .map_err(AppointmentError::from_upstream)?;

        info!("Scheduled appointment {} into slot {}", appointment_id, slot.id);
        Ok(updated_or(result, current, |a| {
            a.status = AppointmentStatus::Scheduled;
            a.slot_id = slot.id.clone();
            a.appointment_date = slot.slot_date;
            a.start_time = Some(slot.start_time);
        }))
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        request: CancelAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id, Some(auth_token)).await?;
        self.lifecycle.validate_cancel(&current)?;

        let body = json!({
            "status": AppointmentStatus::Cancelled,
            "cancellation_reason": request.reason,
        });

        let result: Value = self.api
            .request(Method::PATCH, &appointment_path(appointment_id, None), Some(auth_token), Some(body))
            .await
            .map_err(AppointmentError::from_upstream)?;

        info!("Cancelled appointment {}", appointment_id);
        Ok(updated_or(result, current, |a| a.status = AppointmentStatus::Cancelled))
    }

    pub async fn get_stats(
        &self,
        filters: &AppointmentFilters,
        auth_token: &str,
    ) -> Result<AppointmentStats, AppointmentError> {
        let appointments = self.list_appointments(filters, auth_token).await?;
        Ok(summarize(&appointments))
    }
}

fn validate_create(request: &mut CreateAppointmentRequest) -> Result<(), AppointmentError> {
    require_non_empty("patient_name", &request.patient_name).map_err(AppointmentError::Validation)?;
    require_non_empty("consultant_id", &request.consultant_id).map_err(AppointmentError::Validation)?;
    require_non_empty("slot_id", &request.slot_id).map_err(AppointmentError::Validation)?;

    request.patient_phone = normalize_phone(&request.patient_phone).ok_or_else(|| {
        AppointmentError::Validation("patient_phone must be a 10 digit mobile number".to_string())
    })?;

    if let Some(ref email) = request.patient_email {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(AppointmentError::Validation("patient_email is not a valid address".to_string()));
        }
    }

    request.patient_name = request.patient_name.trim().to_string();
    Ok(())
}

/// The upper bound applies only when the paid amount is known.
fn validate_refund_amount(amount: f64, paid: Option<f64>) -> Result<(), AppointmentError> {
    match paid {
        Some(paid) if amount <= 0.0 || amount > paid => Err(AppointmentError::Validation(format!(
            "refund amount must be more than 0 and at most {}",
            paid
        ))),
        None if amount <= 0.0 => Err(AppointmentError::Validation(
            "refund amount must be a positive amount".to_string(),
        )),
        _ => Ok(()),
    }
}

fn slot_error(err: SlotError) -> AppointmentError {
    match err {
        SlotError::NotFound => AppointmentError::Validation("slot not found".to_string()),
        SlotError::SlotFull => AppointmentError::SlotUnavailable,
        other => AppointmentError::Upstream(other.to_string()),
    }
}

fn appointment_path(appointment_id: &str, action: Option<&str>) -> String {
    let id = urlencoding::encode(appointment_id);
    match action {
        Some(action) => format!("/appointments/{}/{}", id, action),
        None => format!("/appointments/{}", id),
    }
}

/// Only filters the upstream understands are forwarded; the rest run locally.
fn upstream_query(filters: &AppointmentFilters) -> String {
    let mut params = Vec::new();

    if let Some(status) = filters.status {
        params.push(format!("status={}", status));
    }
    if let Some(ref consultant_id) = filters.consultant_id {
        params.push(format!("consultant_id={}", urlencoding::encode(consultant_id)));
    }
    if let Some(date) = filters.date {
        params.push(format!("date={}", date));
    }

    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

fn parse_appointments(value: Value) -> Result<Vec<Appointment>, AppointmentError> {
    unwrap_list(value)
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Appointment>, _>>()
        .map_err(|e| AppointmentError::Upstream(format!("Malformed appointment list: {}", e)))
}

fn parse_appointment(value: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value(unwrap_item(value))
        .map_err(|e| AppointmentError::Upstream(format!("Malformed appointment: {}", e)))
}

/// Action endpoints may answer with the updated record or a bare acknowledgement.
fn updated_or<F>(result: Value, mut current: Appointment, apply: F) -> Appointment
where
    F: FnOnce(&mut Appointment),
{
    match parse_appointment(result) {
        Ok(updated) => updated,
        Err(_) => {
            apply(&mut current);
            current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn request(phone: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: None,
            mr_no: None,
            patient_name: "  Asha Rao ".to_string(),
            patient_phone: phone.to_string(),
            patient_email: None,
            gender: Some("female".to_string()),
            age: Some(34),
            consultant_id: "c-1".to_string(),
            slot_id: "s-1".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2030, 1, 15).unwrap(),
            amount: Some(500.0),
        }
    }

    #[test]
    fn test_validate_create_normalizes() {
        let mut req = request("+91 98765 43210");
        validate_create(&mut req).unwrap();
        assert_eq!(req.patient_phone, "9876543210");
        assert_eq!(req.patient_name, "Asha Rao");
    }

    #[test]
    fn test_validate_create_rejects_bad_phone() {
        let mut req = request("12345");
        assert_matches!(validate_create(&mut req), Err(AppointmentError::Validation(_)));
    }

    #[test]
    fn test_upstream_query() {
        let filters = AppointmentFilters {
            status: Some(AppointmentStatus::Scheduled),
            consultant_id: Some("c 1".to_string()),
            search: Some("asha".to_string()),
            ..Default::default()
        };
        assert_eq!(upstream_query(&filters), "?status=scheduled&consultant_id=c%201");
        assert_eq!(upstream_query(&AppointmentFilters::default()), "");
    }

    #[test]
    fn test_updated_or_falls_back_to_local_update() {
        let current: Appointment = serde_json::from_value(json!({
            "id": "a-1",
            "patient_name": "Asha Rao",
            "consultant_id": "c-1",
            "slot_id": "s-1",
            "appointment_date": "2030-01-15",
            "status": "scheduled"
        }))
        .unwrap();

        let updated = updated_or(json!({"message": "ok"}), current, |a| a.status = AppointmentStatus::Completed);
        assert_eq!(updated.status, AppointmentStatus::Completed);
    }

    #[test]
    fn test_refund_amount_bounds() {
        assert!(validate_refund_amount(200.0, Some(500.0)).is_ok());
        assert_matches!(
            validate_refund_amount(600.0, Some(500.0)),
            Err(AppointmentError::Validation(msg)) if msg.ends_with("at most 500")
        );
        assert_matches!(validate_refund_amount(0.0, Some(500.0)), Err(AppointmentError::Validation(_)));
    }

    #[test]
    fn test_refund_amount_without_known_fee() {
        assert!(validate_refund_amount(1_000_000.0, None).is_ok());
        assert_matches!(
            validate_refund_amount(-5.0, None),
            Err(AppointmentError::Validation(msg)) if msg == "refund amount must be a positive amount"
        );
    }
}
