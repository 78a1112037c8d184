//! `Stripe-Signature` verification.
//!
//! The header carries a timestamp and one or more signatures:
//! `t=1700000000,v1=5257a8...,v1=...`. Each `v1` is the hex HMAC-SHA256 of
//! `"{t}.{raw body}"` keyed with the endpoint secret.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(PaymentError::InvalidSignatureFormat(
                "expected key=value pairs".to_owned(),
            ));
        };
        match key {
            "t" => {
                let t = value.parse::<i64>().map_err(|_| {
                    PaymentError::InvalidSignatureFormat("timestamp is not a number".to_owned())
                })?;
                timestamp = Some(t);
            }
            "v1" => {
                // Undecodable entries cannot match; skip them like unknown schemes.
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::InvalidSignatureFormat("missing timestamp".to_owned()))?;
    if signatures.is_empty() {
        return Err(PaymentError::InvalidSignatureFormat(
            "missing v1 signature".to_owned(),
        ));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute(payload: &[u8], secret: &str, timestamp: i64) -> Result<Vec<u8>, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::InvalidSignatureFormat(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verifies a webhook payload against its `Stripe-Signature` header.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignatureFormat` for a malformed header,
/// `PaymentError::TimestampOutsideTolerance` for a stale timestamp, and
/// `PaymentError::InvalidSignature` if no signature matches.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<(), PaymentError> {
    let header = parse_header(header)?;
    if now.timestamp() - header.timestamp > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::TimestampOutsideTolerance);
    }

    let expected = compute(payload, secret, header.timestamp)?;
    let matched = header
        .signatures
        .iter()
        .filter(|candidate| candidate.len() == expected.len())
        .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected.as_slice())));
    if matched {
        Ok(())
    } else {
        Err(PaymentError::InvalidSignature)
    }
}

/// Builds a `Stripe-Signature` header value for `payload`.
///
/// # Errors
///
/// Returns `PaymentError::InvalidSignatureFormat` if the secret cannot key
/// the MAC.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, PaymentError> {
    let signature = compute(payload, secret, timestamp)?;
    Ok(format!("t={timestamp},v1={}", hex::encode(signature)))
}
