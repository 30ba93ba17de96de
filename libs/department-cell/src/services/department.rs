use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use consultant_cell::{Consultant, ConsultantFilters, ConsultantService};
use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};
use shared_utils::validation::contains_ignore_case;

use crate::models::{Department, DepartmentError, HospitalService};

pub struct DepartmentService {
    api: HospitalApiClient,
    consultants: ConsultantService,
}

impl DepartmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
            consultants: ConsultantService::new(config),
        }
    }

    /// Active departments sorted by name, optionally narrowed by a name search.
    pub async fn list_departments(&self, search: Option<&str>) -> Result<Vec<Department>, DepartmentError> {
        debug!("Fetching departments");

        let result: Value = self.api
            .request(Method::GET, "/departments", None, None)
            .await
            .map_err(DepartmentError::from_upstream)?;

        let departments = unwrap_list(result)
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Department>, _>>()
            .map_err(|e| DepartmentError::Upstream(format!("Malformed department list: {}", e)))?;

        Ok(filter_departments(departments, search.unwrap_or("")))
    }

    pub async fn get_department(&self, department_id: &str) -> Result<Department, DepartmentError> {
        debug!("Fetching department {}", department_id);

        let path = format!("/departments/{}", urlencoding::encode(department_id));
        let result: Value = self.api
            .request(Method::GET, &path, None, None)
            .await
            .map_err(DepartmentError::from_upstream)?;

        serde_json::from_value(unwrap_item(result))
            .map_err(|e| DepartmentError::Upstream(format!("Malformed department: {}", e)))
    }

    pub async fn get_services(&self, department_id: &str) -> Result<Vec<HospitalService>, DepartmentError> {
        let department = self.get_department(department_id).await?;
        Ok(department.services)
    }

    pub async fn get_consultants(&self, department_id: &str) -> Result<Vec<Consultant>, DepartmentError> {
        // 404 for an unknown department rather than an empty list
        self.get_department(department_id).await?;

        let filters = ConsultantFilters {
            department_id: Some(department_id.to_string()),
            ..ConsultantFilters::default()
        };

        self.consultants
            .list_consultants(&filters)
            .await
            .map_err(|e| DepartmentError::Upstream(e.to_string()))
    }
}

fn filter_departments(departments: Vec<Department>, search: &str) -> Vec<Department> {
    let mut filtered: Vec<Department> = departments
        .into_iter()
        .filter(|d| d.is_active && contains_ignore_case(&d.name, search))
        .collect();
    filtered.sort_by_key(|d| d.name.to_lowercase());
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn department(name: &str, active: bool) -> Department {
        Department {
            id: name.to_lowercase(),
            name: name.to_string(),
            slug: None,
            description: None,
            image_url: None,
            is_active: active,
            services: Vec::new(),
        }
    }

    #[test]
    fn test_filter_departments() {
        let all = vec![
            department("Orthopaedics", true),
            department("Cardiology", true),
            department("Closed Ward", false),
            department("Cardiac Surgery", true),
        ];

        let names: Vec<String> = filter_departments(all.clone(), "CARD").into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Cardiac Surgery", "Cardiology"]);

        assert_eq!(filter_departments(all, "").len(), 3);
    }
}
