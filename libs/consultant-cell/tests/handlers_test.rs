use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use consultant_cell::router::consultant_routes;
use shared_utils::test_utils::{MockHospitalResponses, TestConfig};

async fn get_json(config: &TestConfig, uri: &str) -> (StatusCode, Value) {
    let response = consultant_routes(config.to_arc())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_list_consultants_by_department_and_search() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/consultants"))
        .and(query_param("department_id", "d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockHospitalResponses::consultant_response("c-2", "Dr. Ravi Menon", "d-1", 600.0),
            MockHospitalResponses::consultant_response("c-1", "Dr. Meera Iyer", "d-1", 750.0),
            MockHospitalResponses::consultant_response("c-9", "Dr. Other Dept", "d-2", 300.0),
        ])))
        .mount(&server)
        .await;

    let (status, body) = get_json(&config, "/?department_id=d-1&search=meera").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["consultants"][0]["id"], "c-1");
    assert_eq!(body["consultants"][0]["fee"], 750.0);
}

#[tokio::test]
async fn test_missing_consultant_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/consultants/c-404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (status, body) = get_json(&config, "/c-404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Consultant not found");
}

#[tokio::test]
async fn test_consultant_slots_only_bookable() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let date = (Local::now() + Duration::days(1)).date_naive().to_string();

    Mock::given(method("GET"))
        .and(path("/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockHospitalResponses::slot_response("s-1", "c-1", &date, "09:00:00", "09:15:00", 0),
            MockHospitalResponses::slot_response("s-2", "c-1", &date, "09:15:00", "09:30:00", 3),
        ])))
        .mount(&server)
        .await;

    let (status, body) = get_json(&config, &format!("/c-1/slots?date={}", date)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["slots"][0]["id"], "s-2");
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/consultants"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (status, _) = get_json(&config, "/").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
