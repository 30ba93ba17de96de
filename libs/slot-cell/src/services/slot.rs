use chrono::NaiveDateTime;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};

use crate::models::{
    CreateSlotRequest, Slot, SlotError, SlotQuery, SlotRangeRequest, SlotRangeResult,
    SlotRangePreview, UpdateSlotRequest,
};
use crate::services::availability::{filter_available, filter_by_status, sort_slots};
use crate::services::range::generate_slot_range;

pub struct SlotService {
    api: HospitalApiClient,
    max_range_days: i64,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
            max_range_days: config.slot_range_max_days,
        }
    }

    /// List slots matching the query, ordered by date and start time.
    pub async fn list_slots(
        &self,
        query: &SlotQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<Slot>, SlotError> {
        let path = format!("/slots{}", build_query_string(query));
        debug!("Fetching slots: {}", path);

        let result: Value = self.api
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(SlotError::from_upstream)?;

        let slots = parse_slots(result)?;
        let mut slots = filter_by_status(slots, query.status);
        sort_slots(&mut slots);

        Ok(slots)
    }

    /// Slots a patient can still book for the consultant on that date.
    pub async fn available_slots(
        &self,
        consultant_id: &str,
        date: chrono::NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<Slot>, SlotError> {
        let query = SlotQuery {
            consultant_id: Some(consultant_id.to_string()),
            date: Some(date),
            ..SlotQuery::default()
        };

        let slots = self.list_slots(&query, None).await?;
        // the upstream may ignore the date filter, so enforce it here too
        let on_date: Vec<Slot> = slots
            .into_iter()
            .filter(|s| s.slot_date == date && s.consultant_id == consultant_id)
            .collect();

        let available = filter_available(on_date, now);
        debug!(
            "Consultant {} has {} bookable slots on {}",
            consultant_id,
            available.len(),
            date
        );
        Ok(available)
    }

    pub async fn get_slot(&self, slot_id: &str, auth_token: Option<&str>) -> Result<Slot, SlotError> {
        let path = format!("/slots/{}", urlencoding::encode(slot_id));
        let result: Value = self.api
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(SlotError::from_upstream)?;

        serde_json::from_value(unwrap_item(result))
            .map_err(|e| SlotError::Upstream(format!("Malformed slot: {}", e)))
    }

    pub async fn create_slot(
        &self,
        request: CreateSlotRequest,
        auth_token: &str,
    ) -> Result<Slot, SlotError> {
        validate_window(&request)?;

        let body = json!({
            "consultant_id": request.consultant_id,
            "slot_date": request.slot_date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "max_slots": request.max_slots,
            "available_slots": request.max_slots,
        });

        let result: Value = self.api
            .request(Method::POST, "/slots", Some(auth_token), Some(body))
            .await
            .map_err(SlotError::from_upstream)?;

        let slot: Slot = serde_json::from_value(unwrap_item(result))
            .map_err(|e| SlotError::Upstream(format!("Malformed slot: {}", e)))?;

        info!("Created slot {} for consultant {}", slot.id, slot.consultant_id);
        Ok(slot)
    }

    pub async fn update_slot(
        &self,
        slot_id: &str,
        request: UpdateSlotRequest,
        auth_token: &str,
    ) -> Result<Slot, SlotError> {
        let current = self.get_slot(slot_id, Some(auth_token)).await?;

        let start = request.start_time.unwrap_or(current.start_time);
        let end = request.end_time.unwrap_or(current.end_time);
        if start >= end {
            return Err(SlotError::InvalidTime("start_time must be before end_time".to_string()));
        }

        let max_slots = request.max_slots.unwrap_or(current.max_slots);
        if max_slots < 1 {
            return Err(SlotError::InvalidCapacity("max_slots must be at least 1".to_string()));
        }

        // shrinking capacity keeps existing bookings counted
        let available = request
            .available_slots
            .unwrap_or_else(|| (max_slots - current.booked_count()).max(0));
        if available < 0 || available > max_slots {
            return Err(SlotError::InvalidCapacity(format!(
                "available_slots must be between 0 and {}",
                max_slots
            )));
        }

        let mut body = serde_json::to_value(&request)
            .map_err(|e| SlotError::Upstream(e.to_string()))?;
        if let Value::Object(ref mut map) = body {
            map.insert("max_slots".to_string(), json!(max_slots));
            map.insert("available_slots".to_string(), json!(available));
        }

        let path = format!("/slots/{}", urlencoding::encode(slot_id));
        let result: Value = self.api
            .request(Method::PUT, &path, Some(auth_token), Some(body))
            .await
            .map_err(SlotError::from_upstream)?;

        info!("Updated slot {}", slot_id);
        serde_json::from_value(unwrap_item(result))
            .map_err(|e| SlotError::Upstream(format!("Malformed slot: {}", e)))
    }

    pub async fn delete_slot(&self, slot_id: &str, auth_token: &str) -> Result<(), SlotError> {
        let path = format!("/slots/{}", urlencoding::encode(slot_id));
        let _: Value = self.api
            .request(Method::DELETE, &path, Some(auth_token), None)
            .await
            .map_err(SlotError::from_upstream)?;

        info!("Deleted slot {}", slot_id);
        Ok(())
    }

    pub fn preview_range(&self, request: &SlotRangeRequest) -> Result<SlotRangePreview, SlotError> {
        generate_slot_range(request, self.max_range_days)
    }

    /// Validates locally, then lets the upstream create the range.
    /// The upstream answer is returned as-is; a count mismatch against the
    /// local preview is reported, not corrected.
    pub async fn create_range(
        &self,
        request: SlotRangeRequest,
        auth_token: &str,
    ) -> Result<SlotRangeResult, SlotError> {
        let preview = self.preview_range(&request)?;

        let body = serde_json::to_value(&request)
            .map_err(|e| SlotError::Upstream(e.to_string()))?;

        let result: Value = self.api
            .request(Method::POST, "/slots/range", Some(auth_token), Some(body))
            .await
            .map_err(SlotError::from_upstream)?;

        let mut slots = parse_slots(result)?;
        sort_slots(&mut slots);

        let diverged = slots.len() != preview.total;
        if diverged {
            warn!(
                "Slot range for consultant {} diverged: preview {} vs created {}",
                request.consultant_id,
                preview.total,
                slots.len()
            );
        } else {
            info!("Created {} slots for consultant {}", slots.len(), request.consultant_id);
        }

        Ok(SlotRangeResult {
            created_total: slots.len(),
            preview_total: preview.total,
            diverged,
            slots,
        })
    }
}

fn validate_window(request: &CreateSlotRequest) -> Result<(), SlotError> {
    if request.consultant_id.trim().is_empty() {
        return Err(SlotError::InvalidRange("consultant_id is required".to_string()));
    }
    if request.start_time >= request.end_time {
        return Err(SlotError::InvalidTime("start_time must be before end_time".to_string()));
    }
    if request.max_slots < 1 {
        return Err(SlotError::InvalidCapacity("max_slots must be at least 1".to_string()));
    }
    Ok(())
}

fn parse_slots(value: Value) -> Result<Vec<Slot>, SlotError> {
    unwrap_list(value)
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Slot>, _>>()
        .map_err(|e| SlotError::Upstream(format!("Malformed slot list: {}", e)))
}

fn build_query_string(query: &SlotQuery) -> String {
    let mut parts = Vec::new();

    if let Some(ref consultant_id) = query.consultant_id {
        parts.push(format!("consultant_id={}", urlencoding::encode(consultant_id)));
    }
    if let Some(date) = query.date {
        parts.push(format!("date={}", date));
    }
    if let Some(from) = query.from {
        parts.push(format!("from={}", from));
    }
    if let Some(to) = query.to {
        parts.push(format!("to={}", to));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_query_string() {
        let query = SlotQuery {
            consultant_id: Some("c 1".to_string()),
            date: NaiveDate::from_ymd_opt(2030, 3, 4),
            ..SlotQuery::default()
        };
        assert_eq!(build_query_string(&query), "?consultant_id=c%201&date=2030-03-04");
        assert_eq!(build_query_string(&SlotQuery::default()), "");
    }
}
