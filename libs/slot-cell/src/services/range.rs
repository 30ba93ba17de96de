use chrono::{Datelike, Duration, NaiveTime};
use tracing::debug;

use crate::models::{SlotDraft, SlotError, SlotRangePreview, SlotRangeRequest};

/// Expands a range request into the slots it describes:
/// every date in `from_date..=to_date` whose weekday is selected, times
/// every `interval_minutes` step that fits entirely inside the time window.
///
/// The result is a preview only; the upstream `/slots/range` endpoint is
/// what creates slots.
pub fn generate_slot_range(
    request: &SlotRangeRequest,
    max_days: i64,
) -> Result<SlotRangePreview, SlotError> {
    validate_range(request, max_days)?;

    let interval = Duration::minutes(request.interval_minutes);
    let times = time_steps(request.start_time, request.end_time, interval);

    let mut slots = Vec::new();
    let mut days_covered = 0;

    for date in request.from_date.iter_days().take_while(|d| *d <= request.to_date) {
        let weekday = date.weekday();
        if !request.days_of_week.is_empty() && !request.days_of_week.contains(&weekday) {
            continue;
        }

        days_covered += 1;
        for (start, end) in &times {
            slots.push(SlotDraft {
                consultant_id: request.consultant_id.clone(),
                slot_date: date,
                day_of_week: weekday,
                start_time: *start,
                end_time: *end,
                max_slots: request.max_slots,
            });
        }
    }

    debug!(
        "Slot range preview for consultant {}: {} slots over {} days",
        request.consultant_id,
        slots.len(),
        days_covered
    );

    Ok(SlotRangePreview {
        total: slots.len(),
        days_covered,
        slots,
        authoritative: false,
    })
}

fn validate_range(request: &SlotRangeRequest, max_days: i64) -> Result<(), SlotError> {
    if request.consultant_id.trim().is_empty() {
        return Err(SlotError::InvalidRange("consultant_id is required".to_string()));
    }

    if request.from_date > request.to_date {
        return Err(SlotError::InvalidRange(
            "from_date must not be after to_date".to_string(),
        ));
    }

    let span_days = (request.to_date - request.from_date).num_days() + 1;
    if span_days > max_days {
        return Err(SlotError::InvalidRange(format!(
            "range covers {} days, at most {} allowed",
            span_days, max_days
        )));
    }

    if request.start_time >= request.end_time {
        return Err(SlotError::InvalidTime(
            "start_time must be before end_time".to_string(),
        ));
    }

    if request.interval_minutes <= 0 {
        return Err(SlotError::InvalidTime(
            "interval_minutes must be positive".to_string(),
        ));
    }

    let window_minutes = (request.end_time - request.start_time).num_minutes();
    if request.interval_minutes > window_minutes {
        return Err(SlotError::InvalidTime(format!(
            "interval_minutes must fit the {} minute window",
            window_minutes
        )));
    }

    if request.max_slots < 1 {
        return Err(SlotError::InvalidCapacity(
            "max_slots must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn time_steps(start: NaiveTime, end: NaiveTime, interval: Duration) -> Vec<(NaiveTime, NaiveTime)> {
    let mut steps = Vec::new();
    let mut cursor = start;

    loop {
        // overflowing_add_signed wraps past midnight; a non-zero wrap means we left the day
        let (next, wrapped) = cursor.overflowing_add_signed(interval);
        if wrapped != 0 || next > end {
            break;
        }
        steps.push((cursor, next));
        cursor = next;
    }

    steps
}
