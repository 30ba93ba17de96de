use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};
use shared_utils::validation::contains_ignore_case;
use slot_cell::{Slot, SlotService};

use crate::models::{Consultant, ConsultantError, ConsultantFilters};

pub struct ConsultantService {
    api: HospitalApiClient,
    slots: SlotService,
}

impl ConsultantService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
            slots: SlotService::new(config),
        }
    }

    pub async fn list_consultants(
        &self,
        filters: &ConsultantFilters,
    ) -> Result<Vec<Consultant>, ConsultantError> {
        let path = match filters.department_id {
            Some(ref department_id) => format!(
                "/consultants?department_id={}",
                urlencoding::encode(department_id)
            ),
            None => "/consultants".to_string(),
        };
        debug!("Fetching consultants: {}", path);

        let result: Value = self.api
            .request(Method::GET, &path, None, None)
            .await
            .map_err(ConsultantError::from_upstream)?;

        let consultants = unwrap_list(result)
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Consultant>, _>>()
            .map_err(|e| ConsultantError::Upstream(format!("Malformed consultant list: {}", e)))?;

        Ok(apply_filters(consultants, filters))
    }

    pub async fn get_consultant(&self, consultant_id: &str) -> Result<Consultant, ConsultantError> {
        debug!("Fetching consultant {}", consultant_id);

        let path = format!("/consultants/{}", urlencoding::encode(consultant_id));
        let result: Value = self.api
            .request(Method::GET, &path, None, None)
            .await
            .map_err(ConsultantError::from_upstream)?;

        serde_json::from_value(unwrap_item(result))
            .map_err(|e| ConsultantError::Upstream(format!("Malformed consultant: {}", e)))
    }

    /// Like [`get_consultant`](Self::get_consultant) but refuses inactive consultants.
    pub async fn get_bookable_consultant(&self, consultant_id: &str) -> Result<Consultant, ConsultantError> {
        let consultant = self.get_consultant(consultant_id).await?;
        if !consultant.is_active {
            return Err(ConsultantError::Inactive);
        }
        Ok(consultant)
    }

    pub async fn available_slots(
        &self,
        consultant_id: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<Slot>, ConsultantError> {
        self.slots
            .available_slots(consultant_id, date, now)
            .await
            .map_err(|e| ConsultantError::Upstream(e.to_string()))
    }
}

/// Applies department, active and name/degree search filters, sorted by name.
pub fn apply_filters(consultants: Vec<Consultant>, filters: &ConsultantFilters) -> Vec<Consultant> {
    let include_inactive = filters.include_inactive.unwrap_or(false);
    let search = filters.search.as_deref().unwrap_or("");

    let mut filtered: Vec<Consultant> = consultants
        .into_iter()
        .filter(|c| include_inactive || c.is_active)
        .filter(|c| {
            filters
                .department_id
                .as_deref()
                .map(|dept| c.department_id == dept)
                .unwrap_or(true)
        })
        .filter(|c| {
            contains_ignore_case(&c.name, search)
                || c.degree.as_deref().map(|d| contains_ignore_case(d, search)).unwrap_or(false)
        })
        .collect();

    filtered.sort_by_key(|c| c.name.to_lowercase());
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consultant(id: &str, name: &str, dept: &str, active: bool) -> Consultant {
        Consultant {
            id: id.to_string(),
            name: name.to_string(),
            department_id: dept.to_string(),
            department_name: None,
            fee: 500.0,
            degree: Some("MBBS".to_string()),
            designation: None,
            experience_years: None,
            image_url: None,
            is_active: active,
        }
    }

    #[test]
    fn test_filters_department_and_active() {
        let all = vec![
            consultant("1", "Dr. Zara", "cardio", true),
            consultant("2", "Dr. Anil", "cardio", true),
            consultant("3", "Dr. Bina", "ortho", true),
            consultant("4", "Dr. Carl", "cardio", false),
        ];
        let filters = ConsultantFilters {
            department_id: Some("cardio".to_string()),
            ..Default::default()
        };

        let names: Vec<String> = apply_filters(all, &filters).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Dr. Anil", "Dr. Zara"]);
    }

    #[test]
    fn test_search_matches_name_or_degree() {
        let mut with_md = consultant("1", "Dr. Zara", "cardio", true);
        with_md.degree = Some("MD Cardiology".to_string());
        let all = vec![with_md, consultant("2", "Dr. Anil", "cardio", true)];

        let by_degree = ConsultantFilters { search: Some("cardiology".into()), ..Default::default() };
        assert_eq!(apply_filters(all.clone(), &by_degree).len(), 1);

        let by_name = ConsultantFilters { search: Some("ANIL".into()), ..Default::default() };
        assert_eq!(apply_filters(all, &by_name)[0].id, "2");
    }
}
