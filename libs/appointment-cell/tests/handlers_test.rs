use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, MockHospitalResponses, TestConfig, TestUser};

fn app(config: &TestConfig) -> Router {
    appointment_routes(config.to_arc())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn request(method: &str, uri: &str, bearer: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", bearer)
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn mount_appointment(server: &MockServer, id: &str, status: &str, payment_status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/appointments/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockHospitalResponses::appointment_response(id, status, payment_status),
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_patient_role_is_forbidden() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_test_token(&TestUser::patient("p@example.com"), &config.jwt_secret, None);

    let response = app(&config)
        .oneshot(request("GET", "/", &format!("Bearer {}", token), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_appointments_search_and_filters() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    let mut other = MockHospitalResponses::appointment_response("a-2", "scheduled", "paid");
    other["patient_name"] = json!("Vikram Shah");
    other["mr_no"] = json!("MR2002");

    Mock::given(method("GET"))
        .and(path("/appointments"))
        .and(query_param("status", "scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            MockHospitalResponses::appointment_response("a-1", "scheduled", "paid"),
            other,
        ]})))
        .mount(&server)
        .await;

    let response = app(&config)
        .oneshot(request("GET", "/?status=scheduled&search=mr2002", &bearer, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["patient_name"], "Vikram Shah");
}

#[tokio::test]
async fn test_complete_requires_scheduled() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    mount_appointment(&server, "a-1", "pending", "pending").await;

    let response = app(&config)
        .oneshot(request("POST", "/a-1/complete", &bearer, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_scheduled_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    mount_appointment(&server, "a-1", "scheduled", "paid").await;
    Mock::given(method("POST"))
        .and(path("/appointments/a-1/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "completed"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&config)
        .oneshot(request("POST", "/a-1/complete", &bearer, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_refund_requires_paid() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    mount_appointment(&server, "a-1", "cancelled", "pending").await;

    let response = app(&config)
        .oneshot(request("POST", "/a-1/refund", &bearer, Some(json!({"reason": "duplicate"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("paid"));
}

#[tokio::test]
async fn test_refund_cancelled_paid_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    mount_appointment(&server, "a-1", "cancelled", "paid").await;
    Mock::given(method("POST"))
        .and(path("/appointments/a-1/refund"))
        .and(body_partial_json(json!({"reason": "doctor unavailable"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockHospitalResponses::appointment_response("a-1", "refunded", "refunded"),
        ))
        .mount(&server)
        .await;

    let response = app(&config)
        .oneshot(request("POST", "/a-1/refund", &bearer, Some(json!({"reason": "doctor unavailable"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["payment_status"], "refunded");
}

#[tokio::test]
async fn test_schedule_onto_full_slot_conflicts() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    mount_appointment(&server, "a-1", "pending", "paid").await;
    Mock::given(method("GET"))
        .and(path("/slots/s-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockHospitalResponses::slot_response("s-9", "c-1", "2030-01-16", "11:00:00", "11:15:00", 0),
        ))
        .mount(&server)
        .await;

    let response = app(&config)
        .oneshot(request("POST", "/a-1/schedule", &bearer, Some(json!({"slot_id": "s-9"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_schedule_pending_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    mount_appointment(&server, "a-1", "pending", "paid").await;
    Mock::given(method("GET"))
        .and(path("/slots/s-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockHospitalResponses::slot_response("s-2", "c-1", "2030-01-16", "11:00:00", "11:15:00", 3),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/appointments/a-1/schedule"))
        .and(body_partial_json(json!({"slot_id": "s-2", "start_time": "11:00:00"})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let response = app(&config)
        .oneshot(request("POST", "/a-1/schedule", &bearer, Some(json!({"slot_id": "s-2"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["slot_id"], "s-2");
    assert_eq!(body["appointment_date"], "2030-01-16");
}

#[tokio::test]
async fn test_create_rejects_invalid_phone() {
    let config = TestConfig::default();
    let bearer = JwtTestUtils::staff_bearer(&config);

    let response = app(&config)
        .oneshot(request(
            "POST",
            "/",
            &bearer,
            Some(json!({
                "patient_name": "Asha Rao",
                "patient_phone": "12345",
                "consultant_id": "c-1",
                "slot_id": "s-1",
                "appointment_date": "2030-01-15"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_counts_statuses() {
    let server = MockServer::start().await;
    let config = TestConfig::with_api_url(&server.uri());
    let bearer = JwtTestUtils::staff_bearer(&config);

    Mock::given(method("GET"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockHospitalResponses::appointment_response("a-1", "scheduled", "paid"),
            MockHospitalResponses::appointment_response("a-2", "scheduled", "paid"),
            MockHospitalResponses::appointment_response("a-3", "pending", "pending"),
        ])))
        .mount(&server)
        .await;

    let response = app(&config)
        .oneshot(request("GET", "/stats", &bearer, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["by_status"]["scheduled"], 2);
    assert_eq!(body["by_payment_status"]["pending"], 1);
    assert_eq!(body["collected"], 1000.0);
}
