//! HMAC-SHA256 verification of Stripe webhook signatures.
//!
//! Stripe signs each webhook delivery and sends the result in the `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1704067200,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! - The signature is computed over `{t}.{raw body}`
//! - The key is the endpoint's webhook secret (`whsec_...`), used as-is
//! - The digest is hex-encoded; several `v1` entries may appear during secret rotation
//! - Deliveries whose timestamp is further than the tolerance from now are rejected
//!
//! See: <https://docs.stripe.com/webhooks#verify-manually>

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Stripe's recommended replay window
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature header contains no v1 signatures")]
    NoSignatures,
    #[error("timestamp {timestamp} is outside the tolerance window")]
    TimestampOutsideTolerance { timestamp: i64 },
    #[error("no signature matches the payload")]
    Mismatch,
}

/// Parsed form of a `Stripe-Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    /// Hex-encoded `v1` signatures, in header order
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                return Err(SignatureError::Malformed);
            };
            match key {
                "t" => timestamp = Some(value.parse::<i64>().map_err(|_| SignatureError::Malformed)?),
                "v1" => signatures.push(value.to_string()),
                // v0 (test-mode legacy) and unknown schemes are ignored
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
        if signatures.is_empty() {
            return Err(SignatureError::NoSignatures);
        }

        Ok(Self { timestamp, signatures })
    }
}

/// Compute the hex-encoded `v1` signature for a payload.
pub fn sign_payload(timestamp: i64, payload: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Build a complete `Stripe-Signature` header value, as Stripe would send it.
pub fn signature_header(timestamp: i64, payload: &[u8], secret: &str) -> Option<String> {
    Some(format!("t={},v1={}", timestamp, sign_payload(timestamp, payload, secret)?))
}

/// Verify a `Stripe-Signature` header against the raw body.
///
/// `now` is the current unix time in seconds. A zero `tolerance` disables the timestamp check.
pub fn verify_signature(header: &str, payload: &[u8], secret: &str, tolerance: Duration, now: i64) -> Result<(), SignatureError> {
    let parsed = SignatureHeader::parse(header)?;

    let expected = sign_payload(parsed.timestamp, payload, secret).ok_or(SignatureError::Mismatch)?;
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| constant_time_eq(candidate.as_bytes(), expected.as_bytes()));
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    if !tolerance.is_zero() && parsed.timestamp.abs_diff(now) > tolerance.as_secs() {
        return Err(SignatureError::TimestampOutsideTolerance {
            timestamp: parsed.timestamp,
        });
    }

    Ok(())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const NOW: i64 = 1704067200; // 2024-01-01 00:00:00 UTC
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    #[test]
    fn test_sign_and_verify() {
        let header = signature_header(NOW, PAYLOAD, SECRET).unwrap();
        assert!(header.starts_with(&format!("t={NOW},v1=")));

        assert_eq!(verify_signature(&header, PAYLOAD, SECRET, DEFAULT_TOLERANCE, NOW), Ok(()));

        // Wrong payload should fail
        assert_eq!(
            verify_signature(&header, b"{}", SECRET, DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::Mismatch)
        );

        // Wrong secret should fail
        assert_eq!(
            verify_signature(&header, PAYLOAD, "whsec_other", DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_signature_is_deterministic_hex() {
        let signature = sign_payload(NOW, b"{}", SECRET).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(Some(signature.clone()), sign_payload(NOW, b"{}", SECRET));
        assert_ne!(Some(signature), sign_payload(NOW + 1, b"{}", SECRET));
    }

    #[test]
    fn test_timestamp_tolerance() {
        let stale = NOW - 301;
        let header = signature_header(stale, PAYLOAD, SECRET).unwrap();

        assert_eq!(
            verify_signature(&header, PAYLOAD, SECRET, DEFAULT_TOLERANCE, NOW),
            Err(SignatureError::TimestampOutsideTolerance { timestamp: stale })
        );
        // Zero tolerance disables the check
        assert_eq!(verify_signature(&header, PAYLOAD, SECRET, Duration::ZERO, NOW), Ok(()));
    }

    #[test]
    fn test_any_v1_signature_may_match() {
        let valid = sign_payload(NOW, PAYLOAD, SECRET).unwrap();
        let header = format!("t={NOW},v1={},v0=deadbeef,v1={valid}", "0".repeat(64));

        assert_eq!(verify_signature(&header, PAYLOAD, SECRET, DEFAULT_TOLERANCE, NOW), Ok(()));
    }

    #[test]
    fn test_malformed_headers() {
        assert_eq!(SignatureHeader::parse("garbage"), Err(SignatureError::Malformed));
        assert_eq!(SignatureHeader::parse("t=abc,v1=00"), Err(SignatureError::Malformed));
        assert_eq!(SignatureHeader::parse("v1=00"), Err(SignatureError::Malformed));
        assert_eq!(SignatureHeader::parse("t=123"), Err(SignatureError::NoSignatures));

        let parsed = SignatureHeader::parse("t=123, v1=aa, v1=bb").unwrap();
        assert_eq!(parsed.timestamp, 123);
        assert_eq!(parsed.signatures, vec!["aa".to_string(), "bb".to_string()]);
    }
}
