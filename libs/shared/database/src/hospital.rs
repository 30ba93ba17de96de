use anyhow::Result;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Typed failure reported by the upstream hospital API.
///
/// Carried inside `anyhow::Error`, so callers recover it with
/// `err.downcast_ref::<ApiError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ApiError::Unauthorized(body),
            404 => ApiError::NotFound(body),
            409 => ApiError::Conflict(body),
            code => ApiError::Status { status: code, body },
        }
    }

    pub fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_)))
    }

    pub fn is_conflict(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Conflict(_)))
    }
}

#[derive(Clone)]
pub struct HospitalApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HospitalApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.hospital_api_url.trim_end_matches('/').to_string(),
            api_key: config.hospital_api_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| ApiError::InvalidHeader(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidHeader(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Hospital API error ({}): {}", status, error_text);
            return Err(ApiError::from_status(status, error_text).into());
        }

        // DELETE and some action endpoints answer 204 with no body
        if status == StatusCode::NO_CONTENT {
            return Ok(serde_json::from_value(Value::Null)?);
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Upstream list endpoints answer either a bare array or `{"data": [...]}`.
pub fn unwrap_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Upstream item endpoints answer either the record or `{"data": {...}}`.
pub fn unwrap_item(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") && map.len() <= 3 => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(url: &str) -> AppConfig {
        AppConfig {
            hospital_api_url: url.to_string(),
            hospital_api_key: "test-api-key".to_string(),
            jwt_secret: "secret".to_string(),
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            redis_url: None,
            wizard_session_ttl_secs: 1800,
            slot_range_max_days: 90,
            port: 3000,
        }
    }

    #[tokio::test]
    async fn test_request_sends_api_key_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consultants"))
            .and(header("x-api-key", "test-api-key"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .mount(&server)
            .await;

        let client = HospitalApiClient::new(&config_for(&server.uri()));
        let result: Value = client
            .request(Method::GET, "/consultants", Some("abc"), None)
            .await
            .unwrap();

        assert_eq!(unwrap_list(result).len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_typed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blogs/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such blog"))
            .mount(&server)
            .await;

        let client = HospitalApiClient::new(&config_for(&server.uri()));
        let err = client
            .request::<Value>(Method::GET, "/blogs/missing", None, None)
            .await
            .unwrap_err();

        assert!(ApiError::is_not_found(&err));
        assert_matches!(err.downcast_ref::<ApiError>(), Some(ApiError::NotFound(body)) if body == "no such blog");
    }

    #[tokio::test]
    async fn test_no_content_response() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/gallery/7"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = HospitalApiClient::new(&config_for(&server.uri()));
        let result: Value = client
            .request(Method::DELETE, "/gallery/7", None, None)
            .await
            .unwrap();

        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_unwrap_envelopes() {
        assert_eq!(unwrap_list(json!({"data": [1, 2]})).len(), 2);
        assert_eq!(unwrap_list(json!([1])).len(), 1);
        assert!(unwrap_list(json!({"message": "ok"})).is_empty());
        assert_eq!(unwrap_item(json!({"data": {"id": 3}, "success": true})), json!({"id": 3}));
        assert_eq!(unwrap_item(json!({"id": 3})), json!({"id": 3}));
    }
}
