//! Callback signature verification.
//!
//! After a client-side payment completes, the gateway supplies a hex-encoded
//! HMAC-SHA256 over `"{gateway_order_id}|{gateway_payment_id}"` keyed with
//! the gateway shared secret. This is the single authorization gate against
//! forged payment confirmations, so the comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Recompute the expected signature for a completed payment.
pub fn expected_signature(secret: &str, gateway_order_id: &str, gateway_payment_id: &str) -> String {
    let payload = format!("{}|{}", gateway_order_id, gateway_payment_id);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a supplied signature against the recomputed one.
pub fn verify(
    secret: &str,
    gateway_order_id: &str,
    gateway_payment_id: &str,
    supplied: &str,
) -> bool {
    let expected = expected_signature(secret, gateway_order_id, gateway_payment_id);
    constant_time_eq(&expected, supplied)
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    #[test]
    fn valid_signature_is_accepted() {
        let sig = expected_signature(SECRET, "order_abc123", "pay_def456");
        assert!(verify(SECRET, "order_abc123", "pay_def456", &sig));
    }

    #[test]
    fn signature_from_wrong_secret_is_rejected() {
        let sig = expected_signature("wrong_secret", "order_abc123", "pay_def456");
        assert!(!verify(SECRET, "order_abc123", "pay_def456", &sig));
    }

    #[test]
    fn signature_over_different_payment_is_rejected() {
        let sig = expected_signature(SECRET, "order_abc123", "pay_other");
        assert!(!verify(SECRET, "order_abc123", "pay_def456", &sig));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let sig = expected_signature(SECRET, "order_abc123", "pay_def456");
        assert!(!verify(SECRET, "order_abc123", "pay_def456", &sig[..sig.len() - 2]));
    }

    #[test]
    fn signature_is_hex_encoded_sha256() {
        let sig = expected_signature(SECRET, "order_abc123", "pay_def456");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
