use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::{unwrap_item, unwrap_list, HospitalApiClient};
use shared_utils::validation::normalize_phone;

use crate::models::{PatientData, PatientError, PatientSearchQuery};

pub const MIN_QUERY_LEN: usize = 3;

pub struct PatientService {
    api: HospitalApiClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
        }
    }

    pub async fn search_patients(
        &self,
        query: PatientSearchQuery,
        auth_token: &str,
    ) -> Result<Vec<PatientData>, PatientError> {
        let query = normalize_query(query)?;
        let path = format!("/patients/search{}", build_query_string(&query));
        debug!("Searching patients: {}", path);

        let result: Value = self.api
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(PatientError::from_upstream)?;

        unwrap_list(result)
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<PatientData>, _>>()
            .map_err(|e| PatientError::Upstream(format!("Malformed patient list: {}", e)))
    }

    pub async fn find_by_mr_no(
        &self,
        mr_no: &str,
        auth_token: Option<&str>,
    ) -> Result<PatientData, PatientError> {
        let mr_no = mr_no.trim();
        if mr_no.is_empty() {
            return Err(PatientError::MissingCriteria);
        }

        let path = format!("/patients/{}", urlencoding::encode(mr_no));
        let result: Value = self.api
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(PatientError::from_upstream)?;

        serde_json::from_value(unwrap_item(result))
            .map_err(|e| PatientError::Upstream(format!("Malformed patient: {}", e)))
    }

    /// Returning patients are only recognised when MRNo and phone agree,
    /// so an MRNo alone never reveals a record.
    pub async fn find_returning_patient(
        &self,
        mr_no: &str,
        phone: &str,
    ) -> Result<PatientData, PatientError> {
        let phone = normalize_phone(phone).ok_or(PatientError::InvalidPhone)?;
        let patient = self.find_by_mr_no(mr_no, None).await?;

        let on_file = patient.phone.as_deref().and_then(normalize_phone);
        if on_file.as_deref() != Some(phone.as_str()) {
            warn!("Phone mismatch for returning patient {}", patient.mr_no);
            return Err(PatientError::NotFound);
        }

        Ok(patient)
    }
}

fn normalize_query(mut query: PatientSearchQuery) -> Result<PatientSearchQuery, PatientError> {
    let trim = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    query.mr_no = trim(query.mr_no);
    query.phone = trim(query.phone);
    query.name = trim(query.name);
    query.q = trim(query.q);

    if query.mr_no.is_none() && query.phone.is_none() && query.name.is_none() && query.q.is_none() {
        return Err(PatientError::MissingCriteria);
    }
    if let Some(ref q) = query.q {
        if q.chars().count() < MIN_QUERY_LEN {
            return Err(PatientError::QueryTooShort(MIN_QUERY_LEN));
        }
    }
    query.phone = query
        .phone
        .map(|phone| normalize_phone(&phone).unwrap_or(phone));

    Ok(query)
}

fn build_query_string(query: &PatientSearchQuery) -> String {
    let params: Vec<String> = [
        ("mr_no", &query.mr_no),
        ("phone", &query.phone),
        ("name", &query.name),
        ("q", &query.q),
    ]
    .iter()
    .filter_map(|&(key, value)| {
        value
            .as_ref()
            .map(|v| format!("{}={}", key, urlencoding::encode(v)))
    })
    .collect();

    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}
