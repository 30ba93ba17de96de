use chrono::NaiveDateTime;

use crate::models::{Slot, SlotStatus};

/// Orders slots by date, then start time, then id for a stable listing.
pub fn sort_slots(slots: &mut [Slot]) {
    slots.sort_by(|a, b| {
        a.slot_date
            .cmp(&b.slot_date)
            .then(a.start_time.cmp(&b.start_time))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Keeps the slots a patient can still book at `now`, in start-time order.
pub fn filter_available(slots: Vec<Slot>, now: NaiveDateTime) -> Vec<Slot> {
    let mut available: Vec<Slot> = slots
        .into_iter()
        .filter(|slot| slot.is_bookable_at(now))
        .collect();
    sort_slots(&mut available);
    available
}

pub fn filter_by_status(slots: Vec<Slot>, status: Option<SlotStatus>) -> Vec<Slot> {
    match status {
        Some(status) => slots.into_iter().filter(|s| s.status == status).collect(),
        None => slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn slot(id: &str, day: u32, hour: u32, available: i32, status: SlotStatus) -> Slot {
        Slot {
            id: id.to_string(),
            consultant_id: "c-1".to_string(),
            slot_date: NaiveDate::from_ymd_opt(2030, 3, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour, 15, 0).unwrap(),
            max_slots: 3,
            available_slots: available,
            status,
        }
    }

    #[test]
    fn test_filter_available_drops_full_past_and_blocked() {
        let now = NaiveDate::from_ymd_opt(2030, 3, 4).unwrap().and_hms_opt(11, 0, 0).unwrap();
        let slots = vec![
            slot("late", 4, 15, 2, SlotStatus::Active),
            slot("past", 4, 9, 2, SlotStatus::Active),
            slot("full", 4, 12, 0, SlotStatus::Active),
            slot("blocked", 4, 13, 2, SlotStatus::Blocked),
            slot("early", 4, 14, 1, SlotStatus::Active),
            slot("tomorrow", 5, 9, 3, SlotStatus::Active),
        ];

        let ids: Vec<String> = filter_available(slots, now).into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["early", "late", "tomorrow"]);
    }

    #[test]
    fn test_zero_capacity_day_yields_nothing() {
        let now = NaiveDate::from_ymd_opt(2030, 3, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let slots = vec![slot("a", 4, 9, 0, SlotStatus::Active), slot("b", 4, 10, 0, SlotStatus::Active)];
        assert!(filter_available(slots, now).is_empty());
    }

    #[test]
    fn test_filter_by_status() {
        let slots = vec![slot("a", 4, 9, 1, SlotStatus::Active), slot("b", 4, 10, 1, SlotStatus::Cancelled)];
        assert_eq!(filter_by_status(slots.clone(), Some(SlotStatus::Cancelled)).len(), 1);
        assert_eq!(filter_by_status(slots, None).len(), 2);
    }
}
