use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub hospital_api_url: String,
    pub hospital_api_key: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            hospital_api_url: "http://localhost:8081".to_string(),
            hospital_api_key: "test-api-key".to_string(),
            razorpay_key_id: "rzp_test_key".to_string(),
            razorpay_key_secret: "rzp_test_secret".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the config at a mock upstream, usually a `wiremock::MockServer`.
    pub fn with_api_url(url: &str) -> Self {
        Self {
            hospital_api_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            hospital_api_url: self.hospital_api_url.clone(),
            hospital_api_key: self.hospital_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            razorpay_key_id: self.razorpay_key_id.clone(),
            razorpay_key_secret: self.razorpay_key_secret.clone(),
            redis_url: None,
            wizard_session_ttl_secs: 1800,
            slot_range_max_days: 90,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn staff(email: &str) -> Self {
        Self::new(email, "staff")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            name: None,
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn staff_bearer(config: &TestConfig) -> String {
        format!(
            "Bearer {}",
            Self::create_test_token(&TestUser::staff("desk@example.com"), &config.jwt_secret, None)
        )
    }
}

/// Canned upstream payloads shaped like the hospital API's JSON.
pub struct MockHospitalResponses;

impl MockHospitalResponses {
    pub fn department_response(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "description": format!("{} department", name),
            "is_active": true,
            "services": [
                { "id": format!("{}-svc-1", id), "name": format!("{} consultation", name) }
            ]
        })
    }

    pub fn consultant_response(id: &str, name: &str, department_id: &str, fee: f64) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "department_id": department_id,
            "department_name": "Cardiology",
            "fee": fee,
            "degree": "MBBS, MD",
            "designation": "Senior Consultant",
            "experience_years": 12,
            "is_active": true
        })
    }

    pub fn slot_response(id: &str, consultant_id: &str, date: &str, start: &str, end: &str, available: i32) -> serde_json::Value {
        json!({
            "id": id,
            "consultant_id": consultant_id,
            "slot_date": date,
            "start_time": start,
            "end_time": end,
            "MaxSlots": 5,
            "AvailableSlots": available,
            "status": "active"
        })
    }

    pub fn appointment_response(id: &str, status: &str, payment_status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "appointment_no": format!("APT-{}", &id[..id.len().min(6)]),
            "mr_no": "MR1001",
            "patient_name": "Asha Rao",
            "patient_phone": "9876543210",
            "consultant_id": "c-1",
            "consultant_name": "Dr. Meera Iyer",
            "slot_id": "s-1",
            "appointment_date": "2030-01-15",
            "start_time": "10:00:00",
            "status": status,
            "payment_status": payment_status,
            "amount": 500.0
        })
    }

    pub fn patient_response(mr_no: &str, name: &str, phone: &str) -> serde_json::Value {
        json!({
            "mr_no": mr_no,
            "name": name,
            "phone": phone,
            "gender": "female",
            "age": 34
        })
    }

    pub fn blog_response(id: &str, title: &str, is_published: bool) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "slug": title.to_lowercase().replace(' ', "-"),
            "content": "Body text",
            "tags": ["health"],
            "is_published": is_published,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn gallery_response(id: &str, category: &str, sort_order: i32) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Image {}", id),
            "image_url": format!("https://cdn.example.com/{}.jpg", id),
            "category": category,
            "sort_order": sort_order
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({ "error": message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_api_url("http://127.0.0.1:9999");
        let app_config = config.to_app_config();

        assert_eq!(app_config.hospital_api_url, "http://127.0.0.1:9999");
        assert_eq!(app_config.hospital_api_key, "test-api-key");
        assert!(app_config.is_configured());
        assert!(app_config.is_payment_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::staff("desk@example.com");
        assert_eq!(user.role, "staff");

        let user_model = user.to_user();
        assert!(user_model.is_staff());
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
