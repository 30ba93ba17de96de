use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;
use serde_json::Value;

use auth_cell::router::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_validate_token_success() {
    let config = TestConfig::default();
    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    let response = auth_routes(config.to_arc())
        .oneshot(post("/validate", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], user.id);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_validate_expired_token_is_unauthorized() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);

    let response = auth_routes(config.to_arc())
        .oneshot(post("/validate", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_reports_invalid_without_error() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_invalid_signature_token(&TestUser::default());

    let response = auth_routes(config.to_arc())
        .oneshot(post("/verify", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["valid"], false);
}

#[tokio::test]
async fn test_profile_requires_token() {
    let config = TestConfig::default();

    let response = auth_routes(config.to_arc())
        .oneshot(post("/profile", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_returns_staff_flag() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_test_token(&TestUser::staff("desk@example.com"), &config.jwt_secret, None);

    let response = auth_routes(config.to_arc())
        .oneshot(post("/profile", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["is_staff"], true);
    assert_eq!(body["email"], "desk@example.com");
}
