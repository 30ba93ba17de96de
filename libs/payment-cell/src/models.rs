use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::ApiError;
use shared_models::error::AppError;
use shared_models::wire::id_string;

/// Checkout order handed to the Razorpay widget. `amount` is in paise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentOrder {
    #[serde(alias = "razorpay_order_id", alias = "orderId", alias = "id")]
    pub order_id: String,
    #[serde(alias = "Amount")]
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, alias = "razorpay_key_id", alias = "keyId")]
    pub key_id: String,
    #[serde(default, deserialize_with = "id_string", alias = "appointmentId")]
    pub appointment_id: String,
}

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentVerification {
    pub verified: bool,
    pub appointment_id: String,
    pub payment_id: String,
    pub status: String,
}

/// Whatever the hospital API answers on verification; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct UpstreamVerification {
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "payment_status")]
    pub status: Option<String>,
}

const FAILED_STATUSES: [&str; 4] = ["failed", "rejected", "declined", "cancelled"];

impl UpstreamVerification {
    /// An explicit flag decides; without one, only a failure status rejects.
    pub(crate) fn is_verified(&self) -> bool {
        let failed_status = self
            .status
            .as_deref()
            .is_some_and(|s| FAILED_STATUSES.contains(&s.trim().to_lowercase().as_str()));
        !failed_status && self.verified.or(self.success).unwrap_or(true)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaymentError {
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Payment signature verification failed")]
    InvalidSignature,

    #[error("Missing payment field: {0}")]
    MissingField(&'static str),

    #[error("Payment was rejected by the hospital")]
    Rejected,

    #[error("Appointment not found")]
    NotFound,

    #[error("Hospital API error: {0}")]
    Upstream(String),
}

impl PaymentError {
    pub fn from_upstream(err: anyhow::Error) -> Self {
        if ApiError::is_not_found(&err) {
            PaymentError::NotFound
        } else {
            PaymentError::Upstream(err.to_string())
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured => AppError::ExternalService(err.to_string()),
            PaymentError::InvalidSignature
            | PaymentError::MissingField(_)
            | PaymentError::Rejected => AppError::BadRequest(err.to_string()),
            PaymentError::NotFound => AppError::NotFound(err.to_string()),
            PaymentError::Upstream(msg) => AppError::ExternalService(msg),
        }
    }
}
