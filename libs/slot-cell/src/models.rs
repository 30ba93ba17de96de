use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;
use shared_models::wire::{clock_time, id_string, opt_clock_time};

// ==============================================================================
// CORE SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    #[serde(deserialize_with = "id_string", alias = "SlotId", alias = "slotId")]
    pub id: String,
    #[serde(deserialize_with = "id_string", alias = "ConsultantId", alias = "consultantId")]
    pub consultant_id: String,
    #[serde(alias = "SlotDate", alias = "slotDate", alias = "date")]
    pub slot_date: NaiveDate,
    #[serde(with = "clock_time", alias = "StartTime", alias = "startTime")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time", alias = "EndTime", alias = "endTime")]
    pub end_time: NaiveTime,
    #[serde(alias = "MaxSlots", alias = "maxSlots")]
    pub max_slots: i32,
    #[serde(alias = "AvailableSlots", alias = "availableSlots")]
    pub available_slots: i32,
    #[serde(default, alias = "Status")]
    pub status: SlotStatus,
}

impl Slot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.slot_date.and_time(self.start_time)
    }

    pub fn has_capacity(&self) -> bool {
        self.available_slots > 0
    }

    pub fn booked_count(&self) -> i32 {
        (self.max_slots - self.available_slots).max(0)
    }

    /// A slot can take a booking when it is active, has capacity and has not started yet.
    pub fn is_bookable_at(&self, now: NaiveDateTime) -> bool {
        self.status == SlotStatus::Active && self.has_capacity() && self.starts_at() > now
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    #[serde(alias = "Active", alias = "available", alias = "open")]
    Active,
    #[serde(alias = "Blocked", alias = "inactive", alias = "closed")]
    Blocked,
    #[serde(alias = "Cancelled", alias = "canceled")]
    Cancelled,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Active => write!(f, "active"),
            SlotStatus::Blocked => write!(f, "blocked"),
            SlotStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotQuery {
    pub consultant_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<SlotStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsQuery {
    pub consultant_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSlotRequest {
    pub consultant_id: String,
    pub slot_date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub max_slots: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSlotRequest {
    #[serde(default, with = "opt_clock_time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "opt_clock_time", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slots: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_slots: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SlotStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRangeRequest {
    pub consultant_id: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    /// Empty means every day of the week.
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub interval_minutes: i64,
    pub max_slots: i32,
}

/// A slot the range would create, before the upstream assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotDraft {
    pub consultant_id: String,
    pub slot_date: NaiveDate,
    pub day_of_week: Weekday,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    pub max_slots: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRangePreview {
    pub slots: Vec<SlotDraft>,
    pub total: usize,
    pub days_covered: usize,
    /// Always false: the upstream decides what actually gets created.
    pub authoritative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRangeResult {
    pub slots: Vec<Slot>,
    pub created_total: usize,
    pub preview_total: usize,
    pub diverged: bool,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("Slot not found")]
    NotFound,

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("Invalid time window: {0}")]
    InvalidTime(String),

    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    #[error("Slot is full")]
    SlotFull,

    #[error("Slot conflicts with an existing slot: {0}")]
    Conflict(String),

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl SlotError {
    pub fn from_upstream(err: anyhow::Error) -> Self {
        if ApiError::is_not_found(&err) {
            SlotError::NotFound
        } else if ApiError::is_conflict(&err) {
            SlotError::Conflict(err.to_string())
        } else {
            SlotError::Upstream(err.to_string())
        }
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::NotFound => AppError::NotFound("Slot not found".to_string()),
            SlotError::InvalidRange(_)
            | SlotError::InvalidTime(_)
            | SlotError::InvalidCapacity(_) => AppError::ValidationError(err.to_string()),
            SlotError::SlotFull | SlotError::Conflict(_) => AppError::Conflict(err.to_string()),
            SlotError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}
