use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::models::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Razorpay checkout signature: hex(HMAC_SHA256("{order_id}|{payment_id}", key_secret)).
pub fn sign_payment(order_id: &str, payment_id: &str, key_secret: &str) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .map_err(|_| PaymentError::NotConfigured)?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_payment_signature(
    order_id: &str,
    payment_id: &str,
    signature: &str,
    key_secret: &str,
) -> Result<(), PaymentError> {
    if key_secret.is_empty() {
        return Err(PaymentError::NotConfigured);
    }

    let signature = hex::decode(signature.trim()).map_err(|e| {
        debug!("Failed to decode payment signature: {}", e);
        PaymentError::InvalidSignature
    })?;

    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .map_err(|_| PaymentError::NotConfigured)?;
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());

    // verify_slice compares in constant time
    mac.verify_slice(&signature).map_err(|_| {
        debug!("Payment signature mismatch for order {}", order_id);
        PaymentError::InvalidSignature
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_signature_round_trip() {
        let signature = sign_payment("order_123", "pay_456", "secret").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_payment_signature("order_123", "pay_456", &signature, "secret").is_ok());
    }

    #[test]
    fn test_tampered_payment_id() {
        let signature = sign_payment("order_123", "pay_456", "secret").unwrap();
        assert_matches!(
            verify_payment_signature("order_123", "pay_999", &signature, "secret"),
            Err(PaymentError::InvalidSignature)
        );
    }

    #[test]
    fn test_non_hex_signature() {
        assert_matches!(
            verify_payment_signature("order_123", "pay_456", "not-hex", "secret"),
            Err(PaymentError::InvalidSignature)
        );
    }

    #[test]
    fn test_missing_secret() {
        assert_matches!(
            verify_payment_signature("order_123", "pay_456", "abcd", ""),
            Err(PaymentError::NotConfigured)
        );
    }
}
