use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::patient_routes;
use patient_cell::PatientService;
use shared_utils::test_utils::{JwtTestUtils, MockHospitalResponses, TestConfig};

async fn staff_get(config: &TestConfig, uri: &str) -> (StatusCode, Value) {
    let response = patient_routes(config.to_arc())
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", JwtTestUtils::staff_bearer(config))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_search_by_phone() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/patients/search"))
        .and(query_param("phone", "9876543210"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockHospitalResponses::patient_response("MR1001", "Asha Rao", "9876543210"),
        ])))
        .mount(&server)
        .await;

    let (status, body) = staff_get(&config, "/search?phone=09876543210").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["patients"][0]["mr_no"], "MR1001");
}

#[tokio::test]
async fn test_search_without_criteria_is_rejected() {
    let config = TestConfig::default();
    let (status, _) = staff_get(&config, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requires_three_characters() {
    let config = TestConfig::default();
    let (status, body) = staff_get(&config, "/search?q=as").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Search text must be at least 3 characters");
}

#[tokio::test]
async fn test_unknown_mr_no_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/patients/MR404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockHospitalResponses::error_response("not found")))
        .mount(&server)
        .await;

    let (status, _) = staff_get(&config, "/MR404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_returning_patient_needs_matching_phone() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/patients/MR1001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": MockHospitalResponses::patient_response("MR1001", "Asha Rao", "+919876543210")
        })))
        .mount(&server)
        .await;

    let service = PatientService::new(&config.to_app_config());

    let found = service.find_returning_patient("MR1001", "98765 43210").await.unwrap();
    assert_eq!(found.name, "Asha Rao");

    assert!(service.find_returning_patient("MR1001", "9123456780").await.is_err());
}
