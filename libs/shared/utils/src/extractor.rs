use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
    body::Body,
};
use tracing::warn;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

fn bearer_token(request: &Request<Body>) -> Result<&str, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let user = validate_token(token, &config.jwt_secret)
        .map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Same as [`auth_middleware`] but only lets admin and staff roles through.
pub async fn staff_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let user = validate_token(token, &config.jwt_secret)
        .map_err(AppError::Auth)?;

    if !user.is_staff() {
        warn!("User {} with role {:?} denied staff access", user.id, user.role);
        return Err(AppError::Forbidden("Staff access required".to_string()));
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// For content managed by staff but read by everyone: reads pass through,
/// carrying the user when a valid staff token is present; writes need staff.
pub async fn staff_writes_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return staff_middleware(State(config), request, next).await;
    }

    let staff = bearer_token(&request)
        .ok()
        .and_then(|token| validate_token(token, &config.jwt_secret).ok())
        .filter(|user| user.is_staff());
    if let Some(user) = staff {
        request.extensions_mut().insert(user);
    }

    Ok(next.run(request).await)
}

pub async fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn app(config: Arc<AppConfig>) -> Router {
        Router::new()
            .route("/staff", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(config, staff_middleware))
    }

    fn request_with(token: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri("/staff");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_staff_middleware_rejects_missing_header() {
        let config = TestConfig::default();
        let response = app(config.to_arc()).oneshot(request_with(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_staff_middleware_rejects_patient_role() {
        let config = TestConfig::default();
        let token = JwtTestUtils::create_test_token(&TestUser::patient("p@example.com"), &config.jwt_secret, None);
        let response = app(config.to_arc()).oneshot(request_with(Some(token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_staff_writes_middleware_lets_reads_through() {
        let config = TestConfig::default();
        let app = Router::new()
            .route("/content", get(|| async { "read" }).post(|| async { "write" }))
            .layer(middleware::from_fn_with_state(config.to_arc(), staff_writes_middleware));

        let read = Request::builder().uri("/content").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(read).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let write = Request::builder().method("POST").uri("/content").body(Body::empty()).unwrap();
        let response = app.oneshot(write).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_staff_middleware_accepts_staff() {
        let config = TestConfig::default();
        let token = JwtTestUtils::create_test_token(&TestUser::staff("desk@example.com"), &config.jwt_secret, None);
        let response = app(config.to_arc()).oneshot(request_with(Some(token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
