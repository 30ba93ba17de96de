use std::cmp::Reverse;

use shared_utils::validation::contains_ignore_case;

use crate::models::{Appointment, AppointmentFilters, AppointmentStats, PaymentStatus};

/// Applies the dashboard filters locally and orders newest first.
pub fn apply_filters(appointments: Vec<Appointment>, filters: &AppointmentFilters) -> Vec<Appointment> {
    let search = filters.search.as_deref().map(str::trim).unwrap_or("");

    let mut filtered: Vec<Appointment> = appointments
        .into_iter()
        .filter(|a| filters.status.map(|s| a.status == s).unwrap_or(true))
        .filter(|a| filters.payment_status.map(|s| a.payment_status == s).unwrap_or(true))
        .filter(|a| {
            filters
                .consultant_id
                .as_deref()
                .map(|id| a.consultant_id == id)
                .unwrap_or(true)
        })
        .filter(|a| filters.date.map(|d| a.appointment_date == d).unwrap_or(true))
        .filter(|a| filters.from.map(|d| a.appointment_date >= d).unwrap_or(true))
        .filter(|a| filters.to.map(|d| a.appointment_date <= d).unwrap_or(true))
        .filter(|a| search.is_empty() || matches_search(a, search))
        .collect();

    filtered.sort_by_key(|a| Reverse((a.appointment_date, a.start_time)));
    filtered
}

fn matches_search(appointment: &Appointment, needle: &str) -> bool {
    let optional = |field: &Option<String>| {
        field
            .as_deref()
            .map(|value| contains_ignore_case(value, needle))
            .unwrap_or(false)
    };

    contains_ignore_case(&appointment.patient_name, needle)
        || optional(&appointment.mr_no)
        || optional(&appointment.patient_phone)
        || optional(&appointment.appointment_no)
}

pub fn summarize(appointments: &[Appointment]) -> AppointmentStats {
    let mut stats = AppointmentStats {
        total: appointments.len(),
        ..AppointmentStats::default()
    };

    for appointment in appointments {
        *stats.by_status.entry(appointment.status).or_insert(0) += 1;
        *stats.by_payment_status.entry(appointment.payment_status).or_insert(0) += 1;
        if appointment.payment_status == PaymentStatus::Paid {
            stats.collected += appointment.amount.unwrap_or(0.0);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::{NaiveDate, NaiveTime};

    fn appointment(id: &str, name: &str, day: u32, hour: u32) -> Appointment {
        Appointment {
            id: id.to_string(),
            appointment_no: Some(format!("APT-{}", id)),
            patient_id: None,
            mr_no: Some(format!("MR{}", id)),
            patient_name: name.to_string(),
            patient_phone: Some("9876543210".to_string()),
            consultant_id: "c-1".to_string(),
            consultant_name: None,
            slot_id: "s-1".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2030, 1, day).unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0),
            status: AppointmentStatus::Scheduled,
            payment_status: PaymentStatus::Paid,
            amount: Some(500.0),
            created_at: None,
        }
    }

    #[test]
    fn test_newest_first() {
        let all = vec![
            appointment("1", "Asha", 10, 9),
            appointment("2", "Bala", 12, 9),
            appointment("3", "Chitra", 12, 15),
        ];

        let ids: Vec<String> = apply_filters(all, &AppointmentFilters::default())
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_search_covers_name_and_mr_no() {
        let all = vec![appointment("1", "Asha Rao", 10, 9), appointment("2", "Bala", 12, 9)];

        let by_name = AppointmentFilters { search: Some("asha".into()), ..Default::default() };
        assert_eq!(apply_filters(all.clone(), &by_name).len(), 1);

        let by_mr = AppointmentFilters { search: Some("mr2".into()), ..Default::default() };
        assert_eq!(apply_filters(all.clone(), &by_mr)[0].id, "2");

        let by_phone = AppointmentFilters { search: Some("98765".into()), ..Default::default() };
        assert_eq!(apply_filters(all, &by_phone).len(), 2);
    }

    #[test]
    fn test_date_range() {
        let all = vec![appointment("1", "Asha", 10, 9), appointment("2", "Bala", 12, 9)];
        let filters = AppointmentFilters {
            from: NaiveDate::from_ymd_opt(2030, 1, 11),
            ..Default::default()
        };
        assert_eq!(apply_filters(all, &filters)[0].id, "2");
    }

    #[test]
    fn test_summarize() {
        let mut pending = appointment("2", "Bala", 12, 9);
        pending.status = AppointmentStatus::Pending;
        pending.payment_status = PaymentStatus::Pending;
        let all = vec![appointment("1", "Asha", 10, 9), pending];

        let stats = summarize(&all);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_status.get(&AppointmentStatus::Pending), Some(&1));
        assert_eq!(stats.by_payment_status.get(&PaymentStatus::Paid), Some(&1));
        assert_eq!(stats.collected, 500.0);
    }
}
