use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{unwrap_item, HospitalApiClient};

use crate::models::{
    PaymentError, PaymentOrder, PaymentVerification, UpstreamVerification, VerifyPaymentRequest,
};
use crate::services::signature::verify_payment_signature;

pub struct PaymentService {
    api: HospitalApiClient,
    key_id: String,
    key_secret: String,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: HospitalApiClient::new(config),
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
        }
    }

    /// Asks the hospital API to open a gateway order for the appointment.
    pub async fn initiate_payment(&self, appointment_id: &str) -> Result<PaymentOrder, PaymentError> {
        if self.key_id.is_empty() {
            return Err(PaymentError::NotConfigured);
        }

        let path = format!("/payments/{}/initiate", urlencoding::encode(appointment_id));
        debug!("Initiating payment: {}", path);

        let result: Value = self.api
            .request(Method::POST, &path, None, Some(json!({})))
            .await
            .map_err(PaymentError::from_upstream)?;

        let mut order: PaymentOrder = serde_json::from_value(unwrap_item(result))
            .map_err(|e| PaymentError::Upstream(format!("Malformed payment order: {}", e)))?;

        if order.key_id.is_empty() {
            order.key_id = self.key_id.clone();
        }
        if order.appointment_id.is_empty() {
            order.appointment_id = appointment_id.to_string();
        }

        info!("Payment order {} opened for appointment {}", order.order_id, appointment_id);
        Ok(order)
    }

    /// Checks the checkout signature locally before the hospital API confirms it.
    pub async fn verify_payment(
        &self,
        appointment_id: &str,
        request: VerifyPaymentRequest,
    ) -> Result<PaymentVerification, PaymentError> {
        if request.razorpay_order_id.trim().is_empty() {
            return Err(PaymentError::MissingField("razorpay_order_id"));
        }
        if request.razorpay_payment_id.trim().is_empty() {
            return Err(PaymentError::MissingField("razorpay_payment_id"));
        }
        if request.razorpay_signature.trim().is_empty() {
            return Err(PaymentError::MissingField("razorpay_signature"));
        }

        if let Err(err) = verify_payment_signature(
            &request.razorpay_order_id,
            &request.razorpay_payment_id,
            &request.razorpay_signature,
            &self.key_secret,
        ) {
            warn!("Rejected payment {} for appointment {}: {}", request.razorpay_payment_id, appointment_id, err);
            return Err(err);
        }

        let path = format!("/payments/{}/verify", urlencoding::encode(appointment_id));
        let body = serde_json::to_value(&request)
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;

        let result: Value = self.api
            .request(Method::POST, &path, None, Some(body))
            .await
            .map_err(PaymentError::from_upstream)?;

        let upstream = parse_verification(result)?;
        let verified = upstream.is_verified();
        if !verified {
            warn!("Hospital API rejected payment {} for appointment {}", request.razorpay_payment_id, appointment_id);
            return Err(PaymentError::Rejected);
        }

        info!("Payment {} verified for appointment {}", request.razorpay_payment_id, appointment_id);
        Ok(PaymentVerification {
            verified,
            appointment_id: appointment_id.to_string(),
            payment_id: request.razorpay_payment_id,
            status: upstream.status.unwrap_or_else(|| "paid".to_string()),
        })
    }
}

/// An empty acknowledgement is accepted; any other body must parse.
fn parse_verification(result: Value) -> Result<UpstreamVerification, PaymentError> {
    match unwrap_item(result) {
        Value::Null => Ok(UpstreamVerification::default()),
        item => serde_json::from_value(item)
            .map_err(|e| PaymentError::Upstream(format!("Malformed verification response: {}", e))),
    }
}
